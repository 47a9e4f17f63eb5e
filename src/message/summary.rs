//! Typed views over terminal SUCCESS metadata.

use std::collections::HashMap;

use super::response::SuccessMessage;
use crate::packstream::Value;

/// What kind of work a query performed, from the `type` metadata entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QueryType {
    /// Read-only query ("r")
    ReadOnly,
    /// Write-only query ("w")
    WriteOnly,
    /// Read-write query ("rw")
    #[default]
    ReadWrite,
    /// Schema-modifying query ("s")
    Schema,
}

impl QueryType {
    /// Parse the wire form.
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "r" => Some(QueryType::ReadOnly),
            "w" => Some(QueryType::WriteOnly),
            "rw" => Some(QueryType::ReadWrite),
            "s" => Some(QueryType::Schema),
            _ => None,
        }
    }
}

/// Update counters from the `stats` metadata entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryStats {
    /// Nodes created
    pub nodes_created: i64,
    /// Nodes deleted
    pub nodes_deleted: i64,
    /// Relationships created
    pub relationships_created: i64,
    /// Relationships deleted
    pub relationships_deleted: i64,
    /// Properties set
    pub properties_set: i64,
    /// Labels added
    pub labels_added: i64,
    /// Labels removed
    pub labels_removed: i64,
    /// Indexes added
    pub indexes_added: i64,
    /// Indexes removed
    pub indexes_removed: i64,
    /// Constraints added
    pub constraints_added: i64,
    /// Constraints removed
    pub constraints_removed: i64,
    /// Whether system updates occurred
    pub contains_system_updates: bool,
    /// Whether data updates occurred
    pub contains_updates: bool,
}

impl QueryStats {
    /// Whether any counter reports a modification.
    pub fn has_updates(&self) -> bool {
        self.contains_updates
            || self.contains_system_updates
            || self.nodes_created > 0
            || self.nodes_deleted > 0
            || self.relationships_created > 0
            || self.relationships_deleted > 0
            || self.properties_set > 0
            || self.labels_added > 0
            || self.labels_removed > 0
            || self.indexes_added > 0
            || self.indexes_removed > 0
            || self.constraints_added > 0
            || self.constraints_removed > 0
    }

    /// Parse from the `stats` map.
    pub fn from_map(map: &HashMap<String, Value>) -> Self {
        let int = |key: &str| map.get(key).and_then(|v| v.as_int()).unwrap_or(0);
        let flag = |key: &str| map.get(key).and_then(|v| v.as_bool()).unwrap_or(false);
        Self {
            nodes_created: int("nodes-created"),
            nodes_deleted: int("nodes-deleted"),
            relationships_created: int("relationships-created"),
            relationships_deleted: int("relationships-deleted"),
            properties_set: int("properties-set"),
            labels_added: int("labels-added"),
            labels_removed: int("labels-removed"),
            indexes_added: int("indexes-added"),
            indexes_removed: int("indexes-removed"),
            constraints_added: int("constraints-added"),
            constraints_removed: int("constraints-removed"),
            contains_system_updates: flag("contains-system-updates"),
            contains_updates: flag("contains-updates"),
        }
    }
}

/// One operator of a query plan tree, from the `plan` metadata entry.
#[derive(Debug, Clone)]
pub struct QueryPlan {
    /// Operator name
    pub operator_type: String,
    /// Operator arguments
    pub args: HashMap<String, Value>,
    /// Identifiers introduced by the operator
    pub identifiers: Vec<String>,
    /// Child operators
    pub children: Vec<QueryPlan>,
}

impl QueryPlan {
    /// Parse from a plan map.
    pub fn from_map(map: &HashMap<String, Value>) -> Option<Self> {
        let operator_type = map
            .get("operatorType")
            .and_then(|v| v.as_str())
            .map(str::to_string)?;
        let args = map
            .get("args")
            .and_then(|v| v.as_map())
            .cloned()
            .unwrap_or_default();
        let identifiers = map
            .get("identifiers")
            .and_then(|v| v.as_list())
            .map(|list| {
                list.iter()
                    .filter_map(|item| item.as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default();
        let children = map
            .get("children")
            .and_then(|v| v.as_list())
            .map(|list| {
                list.iter()
                    .filter_map(|item| item.as_map().and_then(QueryPlan::from_map))
                    .collect()
            })
            .unwrap_or_default();
        Some(Self {
            operator_type,
            args,
            identifiers,
            children,
        })
    }
}

/// An executed plan with runtime counters, from the `profile` entry.
#[derive(Debug, Clone)]
pub struct QueryProfile {
    /// The plan operator
    pub plan: QueryPlan,
    /// Storage hits
    pub db_hits: i64,
    /// Rows produced
    pub rows: i64,
    /// Profiled children
    pub children: Vec<QueryProfile>,
}

impl QueryProfile {
    /// Parse from a profile map.
    pub fn from_map(map: &HashMap<String, Value>) -> Option<Self> {
        let plan = QueryPlan::from_map(map)?;
        let int = |key: &str| map.get(key).and_then(|v| v.as_int()).unwrap_or(0);
        let children = map
            .get("children")
            .and_then(|v| v.as_list())
            .map(|list| {
                list.iter()
                    .filter_map(|item| item.as_map().and_then(QueryProfile::from_map))
                    .collect()
            })
            .unwrap_or_default();
        Some(Self {
            plan,
            db_hits: int("dbHits"),
            rows: int("rows"),
            children,
        })
    }
}

/// Severity of a server notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationSeverity {
    /// Something the caller should act on
    Warning,
    /// Purely informational
    Information,
}

impl NotificationSeverity {
    /// Parse the wire form; anything unknown reads as information.
    pub fn from_str(s: &str) -> Self {
        if s.eq_ignore_ascii_case("warning") {
            NotificationSeverity::Warning
        } else {
            NotificationSeverity::Information
        }
    }
}

/// Location a notification refers to within the query text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NotificationPosition {
    /// 1-based line
    pub line: i64,
    /// 1-based column
    pub column: i64,
    /// 0-based offset
    pub offset: i64,
}

/// A server notification attached to a result.
#[derive(Debug, Clone)]
pub struct Notification {
    /// Notification code
    pub code: String,
    /// Short title
    pub title: String,
    /// Longer description
    pub description: String,
    /// Severity classification
    pub severity: NotificationSeverity,
    /// Position in the query, when the server provides one
    pub position: Option<NotificationPosition>,
}

impl Notification {
    /// Parse from a notification map.
    pub fn from_map(map: &HashMap<String, Value>) -> Option<Self> {
        let code = map.get("code").and_then(|v| v.as_str()).map(str::to_string)?;
        let text = |key: &str| {
            map.get(key)
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_string()
        };
        let severity = map
            .get("severity")
            .and_then(|v| v.as_str())
            .map(NotificationSeverity::from_str)
            .unwrap_or(NotificationSeverity::Information);
        let position = map.get("position").and_then(|v| v.as_map()).and_then(|pos| {
            Some(NotificationPosition {
                line: pos.get("line").and_then(|v| v.as_int())?,
                column: pos.get("column").and_then(|v| v.as_int())?,
                offset: pos.get("offset").and_then(|v| v.as_int()).unwrap_or(0),
            })
        });
        Some(Self {
            code,
            title: text("title"),
            description: text("description"),
            severity,
            position,
        })
    }
}

/// Terminal metadata of a completed (or discarded) result stream.
#[derive(Debug, Clone, Default)]
pub struct ResultSummary {
    /// Kind of work the query performed
    pub query_type: Option<QueryType>,
    /// Update counters
    pub stats: QueryStats,
    /// Plan, present for EXPLAIN
    pub plan: Option<QueryPlan>,
    /// Profile, present for PROFILE
    pub profile: Option<QueryProfile>,
    /// Server notifications
    pub notifications: Vec<Notification>,
    /// Bookmark for causal chaining
    pub bookmark: Option<String>,
    /// Database the result came from
    pub db: Option<String>,
    /// Milliseconds until the first record was available
    pub t_first: Option<i64>,
    /// Milliseconds until the last record was consumed
    pub t_last: Option<i64>,
}

impl ResultSummary {
    /// Assemble from the terminal SUCCESS of a PULL or DISCARD.
    pub fn from_success(success: &SuccessMessage) -> Self {
        let query_type = success
            .get("type")
            .and_then(|v| v.as_str())
            .and_then(QueryType::from_str);
        let stats = success.stats().map(QueryStats::from_map).unwrap_or_default();
        let plan = success
            .get("plan")
            .and_then(|v| v.as_map())
            .and_then(QueryPlan::from_map);
        let profile = success
            .get("profile")
            .and_then(|v| v.as_map())
            .and_then(QueryProfile::from_map);
        let notifications = success
            .get("notifications")
            .and_then(|v| v.as_list())
            .map(|list| {
                list.iter()
                    .filter_map(|item| item.as_map().and_then(Notification::from_map))
                    .collect()
            })
            .unwrap_or_default();
        Self {
            query_type,
            stats,
            plan,
            profile,
            notifications,
            bookmark: success.bookmark().map(str::to_string),
            db: success.db().map(str::to_string),
            t_first: success.t_first(),
            t_last: success.t_last(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::signature;
    use crate::packstream::Structure;

    #[test]
    fn test_query_type_parsing() {
        assert_eq!(QueryType::from_str("r"), Some(QueryType::ReadOnly));
        assert_eq!(QueryType::from_str("w"), Some(QueryType::WriteOnly));
        assert_eq!(QueryType::from_str("rw"), Some(QueryType::ReadWrite));
        assert_eq!(QueryType::from_str("s"), Some(QueryType::Schema));
        assert_eq!(QueryType::from_str("x"), None);
    }

    #[test]
    fn test_stats_parsing() {
        let mut map = HashMap::new();
        map.insert("nodes-created".to_string(), Value::Integer(5));
        map.insert("properties-set".to_string(), Value::Integer(10));
        map.insert("contains-updates".to_string(), Value::Boolean(true));

        let stats = QueryStats::from_map(&map);
        assert_eq!(stats.nodes_created, 5);
        assert_eq!(stats.properties_set, 10);
        assert!(stats.contains_updates);
        assert!(stats.has_updates());

        assert!(!QueryStats::default().has_updates());
    }

    #[test]
    fn test_plan_parsing() {
        let mut child = HashMap::new();
        child.insert("operatorType".to_string(), Value::from("ProduceResults"));

        let mut map = HashMap::new();
        map.insert("operatorType".to_string(), Value::from("AllNodesScan"));
        map.insert(
            "identifiers".to_string(),
            Value::List(vec![Value::from("n")]),
        );
        map.insert("children".to_string(), Value::List(vec![Value::Map(child)]));

        let plan = QueryPlan::from_map(&map).unwrap();
        assert_eq!(plan.operator_type, "AllNodesScan");
        assert_eq!(plan.identifiers, vec!["n"]);
        assert_eq!(plan.children.len(), 1);
        assert_eq!(plan.children[0].operator_type, "ProduceResults");
    }

    #[test]
    fn test_profile_parsing() {
        let mut map = HashMap::new();
        map.insert("operatorType".to_string(), Value::from("Filter"));
        map.insert("dbHits".to_string(), Value::Integer(100));
        map.insert("rows".to_string(), Value::Integer(10));

        let profile = QueryProfile::from_map(&map).unwrap();
        assert_eq!(profile.plan.operator_type, "Filter");
        assert_eq!(profile.db_hits, 100);
        assert_eq!(profile.rows, 10);
    }

    #[test]
    fn test_notification_parsing() {
        let mut pos = HashMap::new();
        pos.insert("line".to_string(), Value::Integer(1));
        pos.insert("column".to_string(), Value::Integer(8));
        pos.insert("offset".to_string(), Value::Integer(7));

        let mut map = HashMap::new();
        map.insert(
            "code".to_string(),
            Value::from("Neo.ClientNotification.Statement.CartesianProduct"),
        );
        map.insert("title".to_string(), Value::from("Cartesian product"));
        map.insert("severity".to_string(), Value::from("WARNING"));
        map.insert("position".to_string(), Value::Map(pos));

        let n = Notification::from_map(&map).unwrap();
        assert_eq!(n.severity, NotificationSeverity::Warning);
        assert_eq!(n.position.unwrap().column, 8);

        // code is mandatory
        assert!(Notification::from_map(&HashMap::new()).is_none());
    }

    #[test]
    fn test_summary_from_success() {
        let mut stats = HashMap::new();
        stats.insert("nodes-created".to_string(), Value::Integer(1));

        let mut metadata = HashMap::new();
        metadata.insert("type".to_string(), Value::from("w"));
        metadata.insert("stats".to_string(), Value::Map(stats));
        metadata.insert("bookmark".to_string(), Value::from("bm:17"));
        metadata.insert("t_last".to_string(), Value::Integer(3));
        metadata.insert("db".to_string(), Value::from("neo4j"));

        let success = SuccessMessage::from_structure(Structure::new(
            signature::SUCCESS,
            vec![Value::Map(metadata)],
        ))
        .unwrap();
        let summary = ResultSummary::from_success(&success);
        assert_eq!(summary.query_type, Some(QueryType::WriteOnly));
        assert_eq!(summary.stats.nodes_created, 1);
        assert_eq!(summary.bookmark.as_deref(), Some("bm:17"));
        assert_eq!(summary.t_last, Some(3));
        assert_eq!(summary.db.as_deref(), Some("neo4j"));
        assert!(summary.plan.is_none());
        assert!(summary.notifications.is_empty());
    }
}
