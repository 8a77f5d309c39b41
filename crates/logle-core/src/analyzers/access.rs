//! # Account Access Analyzer
//!
//! Builds a graph of accesses to user accounts from a CSV file.
//!
//! The first line is a header naming the columns; it must contain
//! `fromx`, `tox`, `attr_count` and `attr_actor_title`, and may contain
//! `attr_actor_manager`. Each later line is one access record.
//!
//! The graph has two kinds of nodes, all unique:
//! - `Actor(actor, title, manager)`: the account that made the accesses.
//! - `User(user)`: the account that was accessed.
//!
//! Each record adds an `Access(count)` edge from actor to user. An account
//! that is both an actor and a user appears as two nodes.

use super::{GraphFormat, GraphStats, SkipCounter};
use crate::csv::{CsvParser, Record};
use crate::export::{DEFAULT_GRAPH_NAME, DotPrinter, PbtxtExporter};
use crate::graph::{GraphSchema, Label, LabelValue, LabeledGraph};
use crate::primitives::{
    ACCESS_ACTOR_FIELD, ACCESS_ACTOR_MANAGER_FIELD, ACCESS_ACTOR_TITLE_FIELD, ACCESS_COUNT_FIELD,
    ACCESS_REQUIRED_FIELDS, ACCESS_USER_FIELD,
};
use crate::{Code, LogleError, Status};
use std::collections::BTreeMap;
use std::iter::Peekable;
use tracing::{debug, info};

const ACTOR_TAG: &str = "Actor";
const USER_TAG: &str = "User";
const ACCESS_TAG: &str = "Access";

// =============================================================================
// HEADER
// =============================================================================

/// Column positions of the fields the graph uses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldIndex {
    width: usize,
    actor: usize,
    user: usize,
    count: usize,
    title: usize,
    manager: Option<usize>,
}

impl FieldIndex {
    /// Validate a header row and locate the fields.
    pub fn from_header(names: &[String]) -> Result<Self, LogleError> {
        if names.is_empty() {
            return Err(LogleError::invalid_argument("First line has no columns."));
        }
        let mut positions: BTreeMap<&str, usize> = BTreeMap::new();
        for (index, name) in names.iter().enumerate() {
            if name.is_empty() {
                return Err(LogleError::invalid_argument(format!(
                    "Column number {} has no name.",
                    index.saturating_add(1)
                )));
            }
            if positions.insert(name, index).is_some() {
                return Err(LogleError::invalid_argument(format!(
                    "More than one column named: {name}"
                )));
            }
        }

        let missing: Vec<&str> = ACCESS_REQUIRED_FIELDS
            .iter()
            .copied()
            .filter(|field| !positions.contains_key(field))
            .collect();
        let position = |field: &str| positions.get(field).copied();
        match (
            position(ACCESS_ACTOR_FIELD),
            position(ACCESS_USER_FIELD),
            position(ACCESS_COUNT_FIELD),
            position(ACCESS_ACTOR_TITLE_FIELD),
        ) {
            (Some(actor), Some(user), Some(count), Some(title)) => Ok(Self {
                width: names.len(),
                actor,
                user,
                count,
                title,
                manager: position(ACCESS_ACTOR_MANAGER_FIELD),
            }),
            _ => Err(LogleError::invalid_argument(format!(
                "The following required fields are missing: {}",
                missing.join(",")
            ))),
        }
    }

    /// Number of columns in the header.
    #[must_use]
    pub fn width(&self) -> usize {
        self.width
    }
}

// =============================================================================
// GRAPH
// =============================================================================

/// One parsed access record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Access<'a> {
    pub actor: &'a str,
    pub title: &'a str,
    pub manager: Option<&'a str>,
    pub user: &'a str,
    pub count: i64,
}

/// Actors, users and the accesses between them.
#[derive(Debug, Clone)]
pub struct AccountAccessGraph {
    graph: LabeledGraph,
}

impl Default for AccountAccessGraph {
    fn default() -> Self {
        let schema = GraphSchema::new()
            .node(ACTOR_TAG, true)
            .node(USER_TAG, true)
            .edge(ACCESS_TAG, true);
        Self {
            graph: LabeledGraph::new(schema),
        }
    }
}

impl AccountAccessGraph {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn actor_label(actor: &str, title: &str, manager: Option<&str>) -> Label {
        Label::new(
            ACTOR_TAG,
            LabelValue::Tuple(vec![
                LabelValue::str(actor),
                LabelValue::str(title),
                manager.map_or(LabelValue::Null, LabelValue::str),
            ]),
        )
    }

    #[must_use]
    pub fn user_label(user: &str) -> Label {
        Label::new(USER_TAG, LabelValue::str(user))
    }

    #[must_use]
    pub fn access_label(count: i64) -> Label {
        Label::new(ACCESS_TAG, LabelValue::Int(count))
    }

    /// Add the nodes and the edge of one access. Values are not validated:
    /// an empty user name becomes a user node labeled with the empty string.
    pub fn add_access(&mut self, access: &Access<'_>) -> Status {
        let actor = self.graph.find_or_add_node(Self::actor_label(
            access.actor,
            access.title,
            access.manager,
        ))?;
        let user = self.graph.find_or_add_node(Self::user_label(access.user))?;
        self.graph
            .find_or_add_edge(actor, user, Self::access_label(access.count))?;
        Ok(())
    }

    #[must_use]
    pub fn graph(&self) -> &LabeledGraph {
        &self.graph
    }

    #[must_use]
    pub fn to_dot(&self) -> String {
        DotPrinter::default().dot_graph(DEFAULT_GRAPH_NAME, &self.graph)
    }
}

// =============================================================================
// ANALYZER
// =============================================================================

/// The `mail` pipeline.
#[derive(Debug)]
pub struct AccessAnalyzer {
    records: Peekable<CsvParser>,
    fields: FieldIndex,
    graph: Option<AccountAccessGraph>,
    processed: usize,
    skips: SkipCounter,
}

impl AccessAnalyzer {
    /// Take ownership of the parser, read the header and check that at least
    /// one data line follows.
    pub fn initialize(parser: CsvParser) -> Result<Self, LogleError> {
        let mut records = parser.peekable();
        let header = match records.next() {
            None => return Err(LogleError::invalid_argument("The input is empty.")),
            Some(header) => header?,
        };
        let fields = FieldIndex::from_header(&header.fields)?;
        if records.peek().is_none() {
            return Err(LogleError::invalid_argument("No data in the input."));
        }
        debug!(columns = fields.width(), "access analyzer initialized");
        Ok(Self {
            records,
            fields,
            graph: None,
            processed: 0,
            skips: SkipCounter::default(),
        })
    }

    /// Add every well-formed record to the graph.
    ///
    /// Lines that fail to tokenize, have the wrong number of fields or a
    /// non-integer count are skipped. A read failure ends the build.
    pub fn build(&mut self) -> Status {
        if self.graph.is_some() {
            return Err(LogleError::invalid_argument(
                "The access graph has already been created.",
            ));
        }
        let mut graph = AccountAccessGraph::new();
        while let Some(item) = self.records.next() {
            let record = match item {
                Ok(record) => record,
                Err(e) if e.code() == Code::InvalidArgument => {
                    self.skips.skip(e.message())?;
                    continue;
                }
                Err(e) => return Err(e),
            };
            match self.parse_record(&record) {
                Ok(access) => {
                    graph.add_access(&access)?;
                    self.processed = self.processed.saturating_add(1);
                }
                Err(reason) => self.skips.skip(&reason)?,
            }
        }
        info!(
            nodes = graph.graph().node_count(),
            edges = graph.graph().edge_count(),
            processed = self.processed,
            skipped = self.skips.count(),
            "built account access graph"
        );
        self.graph = Some(graph);
        Ok(())
    }

    fn parse_record<'r>(&self, record: &'r Record) -> Result<Access<'r>, String> {
        let fields = &record.fields;
        if fields.len() != self.fields.width {
            return Err(format!(
                "line {} has {} fields, expected {}",
                record.line,
                fields.len(),
                self.fields.width
            ));
        }
        let count_text = fields[self.fields.count].trim();
        let count = count_text
            .parse::<i64>()
            .map_err(|_| format!("line {}: count '{count_text}' is not an integer", record.line))?;
        Ok(Access {
            actor: &fields[self.fields.actor],
            title: &fields[self.fields.title],
            manager: self.fields.manager.map(|i| fields[i].as_str()),
            user: &fields[self.fields.user],
            count,
        })
    }

    /// Empty before `build`.
    #[must_use]
    pub fn render(&self, format: GraphFormat) -> String {
        match (&self.graph, format) {
            (None, _) => String::new(),
            (Some(g), GraphFormat::Dot) => g.to_dot(),
            (Some(g), GraphFormat::PbTxt) => PbtxtExporter::new(g.graph()).to_pbtxt(),
        }
    }

    #[must_use]
    pub fn stats(&self) -> GraphStats {
        GraphStats {
            nodes: self.graph.as_ref().map_or(0, |g| g.graph().node_count()),
            edges: self.graph.as_ref().map_or(0, |g| g.graph().edge_count()),
            records_processed: self.processed,
            records_skipped: self.skips.count(),
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
