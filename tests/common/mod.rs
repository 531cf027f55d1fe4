#![allow(dead_code)]

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use procedure_gateway::prelude::*;
use tokio::sync::Notify;

/// One call that reached the executor.
#[derive(Debug, Clone, PartialEq)]
pub enum Recorded {
    Batch(String),
    Statement(String, Vec<RowValues>),
}

/// Holds the first batch open until the test releases it.
#[derive(Default)]
pub struct BatchGate {
    pub entered: Notify,
    pub release: Notify,
}

/// `Executor` fake: records every call, answers statements with canned rows and
/// schema introspection with a configurable column listing.
pub struct RecordingExecutor {
    calls: Mutex<Vec<Recorded>>,
    introspections: Mutex<usize>,
    listing: Mutex<Vec<(String, String, String)>>,
    rows: ResultSet,
    fail_at: Option<usize>,
    gate: Option<Arc<BatchGate>>,
}

impl RecordingExecutor {
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            introspections: Mutex::new(0),
            listing: Mutex::new(flight_listing()),
            rows: ResultSet::default(),
            fail_at: None,
            gate: None,
        }
    }

    /// Canned rows returned by every non-introspection statement.
    pub fn with_rows(mut self, rows: ResultSet) -> Self {
        self.rows = rows;
        self
    }

    /// Make the `n`th recorded call (0-based) fail with a driver-style error.
    pub fn failing_at(mut self, n: usize) -> Self {
        self.fail_at = Some(n);
        self
    }

    /// Park inside the first `execute_batch` until `gate.release` is notified.
    pub fn gated(mut self, gate: Arc<BatchGate>) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn set_listing(&self, listing: Vec<(String, String, String)>) {
        *self.listing.lock().unwrap() = listing;
    }

    pub fn calls(&self) -> Vec<Recorded> {
        self.calls.lock().unwrap().clone()
    }

    pub fn batches(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Recorded::Batch(sql) => Some(sql),
                Recorded::Statement(..) => None,
            })
            .collect()
    }

    pub fn introspections(&self) -> usize {
        *self.introspections.lock().unwrap()
    }

    fn record(&self, call: Recorded) -> Result<(), GatewayError> {
        let mut calls = self.calls.lock().unwrap();
        let index = calls.len();
        calls.push(call);
        if self.fail_at == Some(index) {
            return Err(GatewayError::ExecutionError(format!(
                "simulated failure on call {index}"
            )));
        }
        Ok(())
    }

    fn listing_result(&self) -> ResultSet {
        let listing = self.listing.lock().unwrap();
        let mut rs = ResultSet::with_capacity(listing.len());
        rs.set_column_names(Arc::new(vec![
            "relation_name".to_string(),
            "relation_type".to_string(),
            "column_name".to_string(),
        ]));
        for (name, kind, column) in listing.iter() {
            rs.add_row_values(vec![
                RowValues::Text(name.clone()),
                RowValues::Text(kind.clone()),
                RowValues::Text(column.clone()),
            ]);
        }
        rs
    }
}

#[async_trait]
impl Executor for RecordingExecutor {
    fn database_type(&self) -> DatabaseType {
        DatabaseType::Sqlite
    }

    async fn execute_batch(&self, sql: &str) -> Result<(), GatewayError> {
        let result = self.record(Recorded::Batch(sql.to_string()));
        if let Some(gate) = &self.gate {
            if self.batches().len() == 1 {
                gate.entered.notify_one();
                gate.release.notified().await;
            }
        }
        result
    }

    async fn execute(&self, sql: &str, params: &[RowValues]) -> Result<ResultSet, GatewayError> {
        if sql.contains("sqlite_master") {
            *self.introspections.lock().unwrap() += 1;
            return Ok(self.listing_result());
        }
        self.record(Recorded::Statement(sql.to_string(), params.to_vec()))?;
        Ok(self.rows.clone())
    }
}

pub fn flight_listing() -> Vec<(String, String, String)> {
    [
        ("airplane", "table", "airlineID"),
        ("airplane", "table", "tail_num"),
        ("airplane", "table", "seat_capacity"),
        ("airport", "table", "airportID"),
        ("airport", "table", "airport_name"),
        ("flights_in_the_air", "view", "departing_from"),
        ("flights_in_the_air", "view", "num_flights"),
    ]
    .into_iter()
    .map(|(a, b, c)| (a.to_string(), b.to_string(), c.to_string()))
    .collect()
}

pub const SEED_SCRIPT: &str = "\
drop table if exists airplane;
create table airplane (airlineID varchar(50), tail_num varchar(50), seat_capacity int);
insert into airplane values ('Delta', 'n106js', 4);
";

pub const EMPTY_SCRIPT: &str = "\
drop table if exists airplane;
create table airplane (airlineID varchar(50), tail_num varchar(50), seat_capacity int);
";

pub const PROCEDURE_SCRIPT: &str = "\
DELIMITER //
create procedure assign_pilot(in ip_flightID varchar(50), in ip_personID varchar(50))
sp_main: begin
    update pilot set commanding_flight = ip_flightID where personID = ip_personID;
end //
DELIMITER ;
";

/// Write the three deployment scripts into `dir`.
pub fn write_scripts(dir: &Path) {
    let files = ScriptSet::default();
    std::fs::write(dir.join(&files.seed_data), SEED_SCRIPT).unwrap();
    std::fs::write(dir.join(&files.empty_tables), EMPTY_SCRIPT).unwrap();
    std::fs::write(dir.join(&files.procedures), PROCEDURE_SCRIPT).unwrap();
}

/// Gateway over a fresh fake executor and a tempdir holding the default scripts.
pub async fn recording_gateway(
    executor: RecordingExecutor,
) -> (Arc<Gateway>, Arc<RecordingExecutor>, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    write_scripts(dir.path());
    let executor = Arc::new(executor);
    let gateway = Gateway::new(
        Arc::clone(&executor) as Arc<dyn Executor>,
        ScriptLoader::new(dir.path()),
        ScriptSet::default(),
    )
    .await
    .unwrap();
    (Arc::new(gateway), executor, dir)
}

pub fn single_column(name: &str, values: &[&str]) -> ResultSet {
    let mut rs = ResultSet::with_capacity(values.len());
    rs.set_column_names(Arc::new(vec![name.to_string()]));
    for v in values {
        rs.add_row_values(vec![RowValues::Text((*v).to_string())]);
    }
    rs
}
