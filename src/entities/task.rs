use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "tasks")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub container_id: Option<Uuid>,
    pub creator_id: Uuid,
    pub owner_id: Uuid,
    pub title: String,
    pub notes: Option<String>,
    pub due: Option<DateTimeUtc>,
    pub completed_at: Option<DateTimeUtc>,
    pub deleted: bool,
    pub hidden: bool,
    #[sea_orm(unique)]
    pub google_id: Option<String>,
    /// Remote id of the parent task, used only for remote ordering.
    pub parent_id: Option<String>,
    pub position: Option<String>,
    pub position_int: i64,
    pub priority: Option<String>,
    pub budget_cents: Option<i64>,
    pub needs_more_info: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::container::Entity",
        from = "Column::ContainerId",
        to = "super::container::Column::Id",
        on_delete = "Cascade"
    )]
    Container,
    #[sea_orm(has_many = "super::task_user::Entity")]
    TaskUsers,
}

impl Related<super::container::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Container.def()
    }
}

impl Related<super::task_user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TaskUsers.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// A task needs more info until it has a due date, priority, budget and container.
    pub fn compute_needs_more_info(&self) -> bool {
        self.due.is_none() || self.priority.is_none() || self.budget_cents.is_none() || self.container_id.is_none()
    }
}

/// Integer form of a remote sortable position string such as `"00000000000000000012"`.
///
/// Positions that overflow `i64` saturate; unparseable ones sort first.
pub fn position_to_int(position: Option<&str>) -> i64 {
    let Some(raw) = position.map(str::trim).filter(|p| !p.is_empty()) else {
        return 0;
    };
    if !raw.bytes().all(|b| b.is_ascii_digit()) {
        return 0;
    }
    let digits = raw.trim_start_matches('0');
    if digits.is_empty() {
        return 0;
    }
    digits.parse::<i64>().unwrap_or(i64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_to_int() {
        assert_eq!(position_to_int(None), 0);
        assert_eq!(position_to_int(Some("")), 0);
        assert_eq!(position_to_int(Some("00000000000000000000")), 0);
        assert_eq!(position_to_int(Some("00000000000000000012")), 12);
        assert_eq!(position_to_int(Some("99999999999999999999")), i64::MAX);
        assert_eq!(position_to_int(Some("abc")), 0);
    }

    #[test]
    fn test_needs_more_info() {
        let mut task = Model {
            id: Uuid::new_v4(),
            container_id: Some(Uuid::new_v4()),
            creator_id: Uuid::new_v4(),
            owner_id: Uuid::new_v4(),
            title: "Fix gutter".to_string(),
            notes: None,
            due: Some(chrono::Utc::now()),
            completed_at: None,
            deleted: false,
            hidden: false,
            google_id: None,
            parent_id: None,
            position: None,
            position_int: 0,
            priority: Some("high".to_string()),
            budget_cents: Some(12_000),
            needs_more_info: true,
        };
        assert!(!task.compute_needs_more_info());

        task.budget_cents = None;
        assert!(task.compute_needs_more_info());
    }
}
