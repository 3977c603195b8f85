use crate::error::{LifeError, Result};
use crate::store::{self, Document, IdSeq};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

// ---------------------------------------------------------------------------
// GoalStatus
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GoalStatus {
    #[default]
    Active,
    Completed,
    Archived,
}

impl fmt::Display for GoalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            GoalStatus::Active => "active",
            GoalStatus::Completed => "completed",
            GoalStatus::Archived => "archived",
        };
        f.write_str(s)
    }
}

// ---------------------------------------------------------------------------
// Goal / Milestone
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Milestone {
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub done: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub done_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Goal {
    pub id: u64,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due: Option<NaiveDate>,
    #[serde(default)]
    pub progress: u8,
    #[serde(default)]
    pub status: GoalStatus,
    #[serde(default)]
    pub milestones: Vec<Milestone>,
    /// Milestone ids are per goal and never reused.
    #[serde(default)]
    pub next_milestone_id: IdSeq,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl Goal {
    fn ensure_active(&self) -> Result<()> {
        if self.status != GoalStatus::Active {
            return Err(LifeError::InvalidTransition {
                kind: "goal",
                id: self.id.to_string(),
                reason: format!("goal is {}", self.status),
            });
        }
        Ok(())
    }

    /// Progress derived from milestones, if there are any.
    pub fn milestone_progress(&self) -> Option<u8> {
        if self.milestones.is_empty() {
            return None;
        }
        let done = self.milestones.iter().filter(|m| m.done).count() as f64;
        Some((done / self.milestones.len() as f64 * 100.0).round() as u8)
    }

    fn sync_progress(&mut self) {
        if let Some(p) = self.milestone_progress() {
            self.progress = p;
        }
    }

    fn milestone_index(&self, milestone_id: u64) -> Result<usize> {
        self.milestones
            .iter()
            .position(|m| m.id == milestone_id)
            .ok_or_else(|| {
                LifeError::not_found("milestone", format!("{}/{}", self.id, milestone_id))
            })
    }

    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        self.status == GoalStatus::Active && self.due.is_some_and(|d| d < today)
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct GoalBook {
    #[serde(default)]
    pub next_id: IdSeq,
    #[serde(default)]
    pub goals: Vec<Goal>,
}

impl Document for GoalBook {
    const FILE: &'static str = "goals.json";
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct GoalStats {
    pub total: usize,
    pub active: usize,
    pub completed: usize,
    pub archived: usize,
    pub overdue: usize,
    pub average_progress: u8,
    pub milestones_done: usize,
    pub milestones_total: usize,
}

impl GoalBook {
    pub fn add(
        &mut self,
        title: &str,
        category: Option<String>,
        due: Option<NaiveDate>,
    ) -> Result<&Goal> {
        let title = title.trim();
        if title.is_empty() {
            return Err(LifeError::InvalidInput("goal title cannot be empty".into()));
        }
        let id = self.next_id.next(self.goals.iter().map(|g| g.id));
        self.goals.push(Goal {
            id,
            title: title.to_string(),
            category: category
                .map(|c| c.trim().to_lowercase())
                .filter(|c| !c.is_empty()),
            due,
            progress: 0,
            status: GoalStatus::Active,
            milestones: Vec::new(),
            next_milestone_id: IdSeq::default(),
            created_at: Utc::now(),
            completed_at: None,
        });
        Ok(&self.goals[self.goals.len() - 1])
    }

    pub fn get(&self, id: u64) -> Result<&Goal> {
        self.goals
            .iter()
            .find(|g| g.id == id)
            .ok_or_else(|| LifeError::not_found("goal", id))
    }

    fn get_mut(&mut self, id: u64) -> Result<&mut Goal> {
        self.goals
            .iter_mut()
            .find(|g| g.id == id)
            .ok_or_else(|| LifeError::not_found("goal", id))
    }

    /// Set progress by hand. `pct` must already be validated to `[0, 100]`.
    pub fn set_progress(&mut self, id: u64, pct: u8) -> Result<&Goal> {
        if pct > 100 {
            return Err(LifeError::InvalidPercentage(pct.to_string()));
        }
        let goal = self.get_mut(id)?;
        goal.ensure_active()?;
        goal.progress = pct;
        Ok(&*goal)
    }

    pub fn add_milestone(&mut self, goal_id: u64, title: &str) -> Result<u64> {
        let title = title.trim();
        if title.is_empty() {
            return Err(LifeError::InvalidInput("milestone title cannot be empty".into()));
        }
        let goal = self.get_mut(goal_id)?;
        goal.ensure_active()?;
        let id = goal
            .next_milestone_id
            .next(goal.milestones.iter().map(|m| m.id));
        goal.milestones.push(Milestone {
            id,
            title: title.to_string(),
            done: false,
            done_at: None,
        });
        goal.sync_progress();
        Ok(id)
    }

    /// Mark a milestone done. Returns the goal's recomputed progress.
    pub fn complete_milestone(&mut self, goal_id: u64, milestone_id: u64) -> Result<u8> {
        let goal = self.get_mut(goal_id)?;
        goal.ensure_active()?;
        let idx = goal.milestone_index(milestone_id)?;
        let m = &mut goal.milestones[idx];
        if !m.done {
            m.done = true;
            m.done_at = Some(Utc::now());
        }
        goal.sync_progress();
        Ok(goal.progress)
    }

    pub fn remove_milestone(&mut self, goal_id: u64, milestone_id: u64) -> Result<Milestone> {
        let goal = self.get_mut(goal_id)?;
        goal.ensure_active()?;
        let idx = goal.milestone_index(milestone_id)?;
        let removed = goal.milestones.remove(idx);
        goal.sync_progress();
        Ok(removed)
    }

    /// active → completed. Sets progress to 100.
    pub fn complete(&mut self, id: u64) -> Result<&Goal> {
        let goal = self.get_mut(id)?;
        goal.ensure_active()?;
        goal.status = GoalStatus::Completed;
        goal.progress = 100;
        goal.completed_at = Some(Utc::now());
        Ok(&*goal)
    }

    /// active|completed → archived. Archiving is final.
    pub fn archive(&mut self, id: u64) -> Result<&Goal> {
        let goal = self.get_mut(id)?;
        if goal.status == GoalStatus::Archived {
            return Err(LifeError::InvalidTransition {
                kind: "goal",
                id: id.to_string(),
                reason: "goal is already archived".into(),
            });
        }
        goal.status = GoalStatus::Archived;
        Ok(&*goal)
    }

    pub fn remove(&mut self, id: u64) -> Result<Goal> {
        let pos = self
            .goals
            .iter()
            .position(|g| g.id == id)
            .ok_or_else(|| LifeError::not_found("goal", id))?;
        Ok(self.goals.remove(pos))
    }

    /// Active goals (or all), soonest due first, undated last.
    pub fn list(&self, include_all: bool) -> Vec<&Goal> {
        let mut out: Vec<&Goal> = self
            .goals
            .iter()
            .filter(|g| include_all || g.status == GoalStatus::Active)
            .collect();
        out.sort_by_key(|g| (g.due.is_none(), g.due, g.id));
        out
    }

    pub fn stats(&self, today: NaiveDate) -> GoalStats {
        let count = |s: GoalStatus| self.goals.iter().filter(|g| g.status == s).count();
        let active: Vec<&Goal> = self
            .goals
            .iter()
            .filter(|g| g.status == GoalStatus::Active)
            .collect();
        let average_progress = if active.is_empty() {
            0
        } else {
            let sum: u32 = active.iter().map(|g| g.progress as u32).sum();
            (sum as f64 / active.len() as f64).round() as u8
        };
        GoalStats {
            total: self.goals.len(),
            active: active.len(),
            completed: count(GoalStatus::Completed),
            archived: count(GoalStatus::Archived),
            overdue: self.goals.iter().filter(|g| g.is_overdue(today)).count(),
            average_progress,
            milestones_done: self
                .goals
                .iter()
                .flat_map(|g| g.milestones.iter())
                .filter(|m| m.done)
                .count(),
            milestones_total: self.goals.iter().map(|g| g.milestones.len()).sum(),
        }
    }
}

pub fn load(home: &Path) -> Result<GoalBook> {
    store::load(home)
}

/// `[#####-----]` style bar, `width` cells wide.
pub fn progress_bar(pct: u8, width: usize) -> String {
    let filled = (pct.min(100) as usize * width + 50) / 100;
    format!("[{}{}]", "#".repeat(filled), "-".repeat(width - filled))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn book() -> GoalBook {
        let mut b = GoalBook::default();
        b.add("Run a marathon", Some("Health".into()), None).unwrap();
        b
    }

    #[test]
    fn milestones_drive_progress() {
        let mut b = book();
        let m1 = b.add_milestone(1, "10k").unwrap();
        b.add_milestone(1, "half").unwrap();
        b.add_milestone(1, "full").unwrap();
        assert_eq!(b.get(1).unwrap().progress, 0);
        assert_eq!(b.complete_milestone(1, m1).unwrap(), 33);
        b.remove_milestone(1, 3).unwrap();
        assert_eq!(b.get(1).unwrap().progress, 50);
    }

    #[test]
    fn milestone_ids_not_reused() {
        let mut b = book();
        b.add_milestone(1, "a").unwrap();
        b.add_milestone(1, "b").unwrap();
        b.remove_milestone(1, 2).unwrap();
        assert_eq!(b.add_milestone(1, "c").unwrap(), 3);
    }

    #[test]
    fn manual_progress_range() {
        let mut b = book();
        b.set_progress(1, 100).unwrap();
        assert!(matches!(
            b.set_progress(1, 101),
            Err(LifeError::InvalidPercentage(_))
        ));
        assert_eq!(b.get(1).unwrap().progress, 100);
    }

    #[test]
    fn completed_goal_milestones_frozen() {
        let mut b = book();
        let a = b.add_milestone(1, "a").unwrap();
        let m2 = b.add_milestone(1, "b").unwrap();
        b.add_milestone(1, "c").unwrap();
        b.complete_milestone(1, a).unwrap();
        b.complete(1).unwrap();
        assert!(matches!(
            b.remove_milestone(1, m2),
            Err(LifeError::InvalidTransition { .. })
        ));
        let g = b.get(1).unwrap();
        assert_eq!(g.progress, 100);
        assert_eq!(g.milestones.len(), 3);
        assert_eq!(g.status, GoalStatus::Completed);
    }

    #[test]
    fn status_is_monotonic() {
        let mut b = book();
        b.complete(1).unwrap();
        assert_eq!(b.get(1).unwrap().progress, 100);
        assert!(b.complete(1).is_err());
        assert!(b.set_progress(1, 10).is_err());
        b.archive(1).unwrap();
        assert!(b.archive(1).is_err());
        assert_eq!(b.get(1).unwrap().status, GoalStatus::Archived);
    }

    #[test]
    fn category_normalized_and_listing() {
        let mut b = book();
        assert_eq!(b.get(1).unwrap().category.as_deref(), Some("health"));
        let due = NaiveDate::from_ymd_opt(2030, 1, 1).unwrap();
        b.add("Learn piano", None, Some(due)).unwrap();
        let listed: Vec<u64> = b.list(false).iter().map(|g| g.id).collect();
        assert_eq!(listed, vec![2, 1]);
        b.archive(2).unwrap();
        assert_eq!(b.list(false).len(), 1);
        assert_eq!(b.list(true).len(), 2);
    }

    #[test]
    fn unknown_milestone() {
        let mut b = book();
        assert!(matches!(
            b.complete_milestone(1, 9),
            Err(LifeError::NotFound { .. })
        ));
        assert!(matches!(
            b.add_milestone(9, "x"),
            Err(LifeError::NotFound { .. })
        ));
    }

    #[test]
    fn bar_rendering() {
        assert_eq!(progress_bar(0, 10), "[----------]");
        assert_eq!(progress_bar(50, 10), "[#####-----]");
        assert_eq!(progress_bar(100, 4), "[####]");
    }
}
