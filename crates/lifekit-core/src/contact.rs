use crate::error::{LifeError, Result};
use crate::store::{self, Document, IdSeq};
use crate::text;
use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    pub id: u64,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    /// `MM-DD` or `YYYY-MM-DD`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub birthday: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields accepted by `add` and `edit`. `None` leaves a field unchanged on edit.
#[derive(Debug, Clone, Default)]
pub struct ContactFields {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub birthday: Option<String>,
    pub tags: Option<Vec<String>>,
    pub notes: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct AddressBook {
    #[serde(default)]
    pub next_id: IdSeq,
    #[serde(default)]
    pub contacts: Vec<Contact>,
}

impl Document for AddressBook {
    const FILE: &'static str = "contacts.json";
}

/// Portable export format: the records without the id counter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContactExport {
    pub version: u32,
    pub exported_at: DateTime<Utc>,
    pub contacts: Vec<Contact>,
}

#[derive(Debug, Clone, Serialize)]
pub struct UpcomingBirthday {
    pub id: u64,
    pub name: String,
    pub date: NaiveDate,
    pub in_days: i64,
    /// Age they turn, when the birth year is known.
    pub turning: Option<i32>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ImportReport {
    pub imported: usize,
    pub reassigned: usize,
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn clean(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

pub fn validate_email(email: &str) -> Result<()> {
    let valid = match email.split_once('@') {
        Some((user, domain)) => !user.is_empty() && !domain.is_empty(),
        None => false,
    };
    if !valid {
        return Err(LifeError::InvalidInput(format!(
            "invalid email '{email}': expected user@domain"
        )));
    }
    Ok(())
}

/// Parse a stored birthday into `(year, month, day)`.
pub fn parse_birthday(s: &str) -> Result<(Option<i32>, u32, u32)> {
    let invalid = || {
        LifeError::InvalidInput(format!("invalid birthday '{s}': expected MM-DD or YYYY-MM-DD"))
    };
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Ok((Some(d.year()), d.month(), d.day()));
    }
    let (m, d) = s.split_once('-').ok_or_else(invalid)?;
    let month: u32 = m.parse().map_err(|_| invalid())?;
    let day: u32 = d.parse().map_err(|_| invalid())?;
    // 2000 is a leap year, so Feb 29 validates.
    NaiveDate::from_ymd_opt(2000, month, day).ok_or_else(invalid)?;
    Ok((None, month, day))
}

fn birthday_in(year: i32, month: u32, day: u32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, day)
        // Feb 29 falls back to Feb 28 outside leap years.
        .or_else(|| NaiveDate::from_ymd_opt(year, month, day - 1))
}

impl Contact {
    fn apply(&mut self, fields: ContactFields) -> Result<()> {
        if let Some(name) = clean(fields.name) {
            self.name = name;
        }
        if let Some(email) = clean(fields.email) {
            validate_email(&email)?;
            self.email = Some(email);
        }
        if let Some(phone) = clean(fields.phone) {
            self.phone = Some(phone);
        }
        if let Some(company) = clean(fields.company) {
            self.company = Some(company);
        }
        if let Some(birthday) = clean(fields.birthday) {
            parse_birthday(&birthday)?;
            self.birthday = Some(birthday);
        }
        if let Some(tags) = fields.tags {
            self.tags = text::normalize_tags(&tags);
        }
        if let Some(notes) = clean(fields.notes) {
            self.notes = Some(notes);
        }
        Ok(())
    }

    pub fn next_birthday(&self, today: NaiveDate) -> Option<UpcomingBirthday> {
        let (year, month, day) = parse_birthday(self.birthday.as_deref()?).ok()?;
        let mut next = birthday_in(today.year(), month, day)?;
        if next < today {
            next = birthday_in(today.year() + 1, month, day)?;
        }
        Some(UpcomingBirthday {
            id: self.id,
            name: self.name.clone(),
            date: next,
            in_days: (next - today).num_days(),
            turning: year.map(|y| next.year() - y),
        })
    }
}

impl AddressBook {
    pub fn add(&mut self, fields: ContactFields) -> Result<&Contact> {
        let name = clean(fields.name.clone())
            .ok_or_else(|| LifeError::InvalidInput("contact name cannot be empty".into()))?;
        let now = Utc::now();
        let mut contact = Contact {
            id: 0,
            name,
            email: None,
            phone: None,
            company: None,
            birthday: None,
            tags: Vec::new(),
            notes: None,
            created_at: now,
            updated_at: now,
        };
        contact.apply(fields)?;
        contact.id = self.next_id.next(self.contacts.iter().map(|c| c.id));
        self.contacts.push(contact);
        Ok(&self.contacts[self.contacts.len() - 1])
    }

    /// Resolve by id, then by exact (case-insensitive) name, then by a unique
    /// name substring.
    pub fn find(&self, key: &str) -> Result<&Contact> {
        let key = key.trim();
        if let Ok(id) = key.parse::<u64>() {
            if let Some(c) = self.contacts.iter().find(|c| c.id == id) {
                return Ok(c);
            }
        }
        if let Some(c) = self
            .contacts
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(key))
        {
            return Ok(c);
        }
        let partial: Vec<&Contact> = self
            .contacts
            .iter()
            .filter(|c| text::matches_any(key, [c.name.as_str()]))
            .collect();
        match partial.as_slice() {
            [one] => Ok(*one),
            [] => Err(LifeError::not_found("contact", key)),
            many => Err(LifeError::InvalidInput(format!(
                "'{key}' matches {} contacts; use the id",
                many.len()
            ))),
        }
    }

    pub fn edit(&mut self, id: u64, fields: ContactFields) -> Result<&Contact> {
        let contact = self
            .contacts
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| LifeError::not_found("contact", id))?;
        let mut updated = contact.clone();
        updated.apply(fields)?;
        updated.updated_at = Utc::now();
        *contact = updated;
        Ok(&*contact)
    }

    pub fn remove(&mut self, id: u64) -> Result<Contact> {
        let pos = self
            .contacts
            .iter()
            .position(|c| c.id == id)
            .ok_or_else(|| LifeError::not_found("contact", id))?;
        Ok(self.contacts.remove(pos))
    }

    /// Alphabetical by name, optionally filtered by tag.
    pub fn list(&self, tag: Option<&str>) -> Vec<&Contact> {
        let mut out: Vec<&Contact> = self
            .contacts
            .iter()
            .filter(|c| tag.map_or(true, |t| text::has_tag(&c.tags, t)))
            .collect();
        out.sort_by_key(|c| c.name.to_lowercase());
        out
    }

    pub fn search(&self, query: &str) -> Vec<&Contact> {
        self.contacts
            .iter()
            .filter(|c| {
                let fields = [
                    Some(c.name.as_str()),
                    c.email.as_deref(),
                    c.phone.as_deref(),
                    c.company.as_deref(),
                    c.notes.as_deref(),
                ];
                text::matches_any(
                    query,
                    fields
                        .into_iter()
                        .flatten()
                        .chain(c.tags.iter().map(String::as_str)),
                )
            })
            .collect()
    }

    pub fn upcoming_birthdays(&self, today: NaiveDate, within_days: i64) -> Vec<UpcomingBirthday> {
        let mut out: Vec<UpcomingBirthday> = self
            .contacts
            .iter()
            .filter_map(|c| c.next_birthday(today))
            .filter(|b| b.in_days <= within_days)
            .collect();
        out.sort_by_key(|b| (b.in_days, b.id));
        out
    }

    pub fn export(&self) -> ContactExport {
        ContactExport {
            version: 1,
            exported_at: Utc::now(),
            contacts: self.contacts.clone(),
        }
    }

    /// Merge an export. Ids are kept when free and reassigned on collision.
    pub fn import(&mut self, export: ContactExport) -> ImportReport {
        let mut report = ImportReport::default();
        let mut used: HashSet<u64> = self.contacts.iter().map(|c| c.id).collect();
        for mut contact in export.contacts {
            if contact.id == 0 || used.contains(&contact.id) {
                let taken: Vec<u64> = used.iter().copied().collect();
                contact.id = self.next_id.next(taken);
                report.reassigned += 1;
            } else {
                self.next_id.observe(contact.id);
            }
            used.insert(contact.id);
            self.contacts.push(contact);
            report.imported += 1;
        }
        report
    }
}

pub fn load(home: &Path) -> Result<AddressBook> {
    store::load(home)
}

pub fn to_json(export: &ContactExport) -> Result<String> {
    Ok(serde_json::to_string_pretty(export)?)
}

pub fn from_json(data: &str) -> Result<ContactExport> {
    Ok(serde_json::from_str(data)?)
}

/// CSV with a header row. Tags are `;`-separated within their column.
pub fn to_csv(contacts: &[Contact]) -> Result<String> {
    let mut w = csv::Writer::from_writer(Vec::new());
    w.write_record([
        "id", "name", "email", "phone", "company", "birthday", "tags", "notes",
    ])?;
    for c in contacts {
        w.write_record([
            c.id.to_string(),
            c.name.clone(),
            c.email.clone().unwrap_or_default(),
            c.phone.clone().unwrap_or_default(),
            c.company.clone().unwrap_or_default(),
            c.birthday.clone().unwrap_or_default(),
            c.tags.join(";"),
            c.notes.clone().unwrap_or_default(),
        ])?;
    }
    let bytes = w
        .into_inner()
        .map_err(|e| LifeError::Io(e.into_error()))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(name: &str) -> ContactFields {
        ContactFields {
            name: Some(name.to_string()),
            ..Default::default()
        }
    }

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn add_validates_email_and_birthday() {
        let mut book = AddressBook::default();
        let bad_email = ContactFields {
            email: Some("not-an-email".into()),
            ..fields("Ann")
        };
        assert!(book.add(bad_email).is_err());
        let local = ContactFields {
            email: Some("root@localhost".into()),
            ..fields("Root")
        };
        assert!(book.add(local).is_ok());
        assert!(validate_email("@example.com").is_err());
        assert!(validate_email("user@").is_err());
        let bad_bday = ContactFields {
            birthday: Some("13-01".into()),
            ..fields("Ann")
        };
        assert!(book.add(bad_bday).is_err());
        assert!(book.contacts.is_empty());

        let ok = ContactFields {
            email: Some("ann@example.com".into()),
            birthday: Some("02-29".into()),
            ..fields("Ann")
        };
        assert_eq!(book.add(ok).unwrap().id, 1);
    }

    #[test]
    fn find_by_id_name_and_partial() {
        let mut book = AddressBook::default();
        book.add(fields("Ada Lovelace")).unwrap();
        book.add(fields("Alan Turing")).unwrap();
        assert_eq!(book.find("2").unwrap().name, "Alan Turing");
        assert_eq!(book.find("ada lovelace").unwrap().id, 1);
        assert_eq!(book.find("turing").unwrap().id, 2);
        assert!(book.find("a").is_err());
        assert!(matches!(book.find("zed"), Err(LifeError::NotFound { .. })));
    }

    #[test]
    fn edit_is_all_or_nothing() {
        let mut book = AddressBook::default();
        book.add(fields("Bob")).unwrap();
        let bad = ContactFields {
            phone: Some("555".into()),
            email: Some("broken".into()),
            ..Default::default()
        };
        assert!(book.edit(1, bad).is_err());
        assert_eq!(book.contacts[0].phone, None);
    }

    #[test]
    fn search_across_fields() {
        let mut book = AddressBook::default();
        book.add(ContactFields {
            company: Some("Initech".into()),
            tags: Some(vec!["work".into()]),
            ..fields("Peter")
        })
        .unwrap();
        assert_eq!(book.search("INITECH").len(), 1);
        assert_eq!(book.search("work").len(), 1);
        assert_eq!(book.search("pete").len(), 1);
        assert!(book.search("lumbergh").is_empty());
    }

    #[test]
    fn birthdays_wrap_the_year() {
        let mut book = AddressBook::default();
        book.add(ContactFields {
            birthday: Some("1990-01-05".into()),
            ..fields("Jan")
        })
        .unwrap();
        book.add(ContactFields {
            birthday: Some("12-30".into()),
            ..fields("Dec")
        })
        .unwrap();
        let upcoming = book.upcoming_birthdays(d("2023-12-28"), 14);
        assert_eq!(upcoming.len(), 2);
        assert_eq!(upcoming[0].name, "Dec");
        assert_eq!(upcoming[1].date, d("2024-01-05"));
        assert_eq!(upcoming[1].turning, Some(34));
    }

    #[test]
    fn leap_day_birthday_in_common_year() {
        let mut book = AddressBook::default();
        book.add(ContactFields {
            birthday: Some("02-29".into()),
            ..fields("Leap")
        })
        .unwrap();
        let b = book.contacts[0].next_birthday(d("2023-02-01")).unwrap();
        assert_eq!(b.date, d("2023-02-28"));
    }

    #[test]
    fn export_import_round_trip() {
        let mut src = AddressBook::default();
        src.add(ContactFields {
            email: Some("a@x.io".into()),
            ..fields("A")
        })
        .unwrap();
        src.add(fields("B")).unwrap();
        src.remove(1).unwrap();
        src.add(fields("C")).unwrap();

        let json = to_json(&src.export()).unwrap();
        let mut dst = AddressBook::default();
        let report = dst.import(from_json(&json).unwrap());
        assert_eq!(report.imported, 2);
        assert_eq!(report.reassigned, 0);
        assert_eq!(dst.contacts, src.contacts);
        // New ids continue after the imported ones.
        assert_eq!(dst.add(fields("D")).unwrap().id, 4);
    }

    #[test]
    fn import_reassigns_colliding_ids() {
        let mut src = AddressBook::default();
        src.add(fields("Imported")).unwrap();
        let mut dst = AddressBook::default();
        dst.add(fields("Existing")).unwrap();
        let report = dst.import(src.export());
        assert_eq!(report.reassigned, 1);
        let ids: Vec<u64> = dst.contacts.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[test]
    fn csv_has_header_and_rows() {
        let mut book = AddressBook::default();
        book.add(ContactFields {
            tags: Some(vec!["a,b".into()]),
            notes: Some("likes, commas".into()),
            ..fields("Carol")
        })
        .unwrap();
        let out = to_csv(&book.contacts).unwrap();
        let mut lines = out.lines();
        assert_eq!(
            lines.next().unwrap(),
            "id,name,email,phone,company,birthday,tags,notes"
        );
        assert_eq!(lines.next().unwrap(), "1,Carol,,,,,a;b,\"likes, commas\"");
    }
}
