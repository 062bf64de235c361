//! PostgREST (Supabase) implementation of [`RecordStore`].
//!
//! ```text
//! find_by_email    GET   /rest/v1/<table>?select=*&email=eq.<e>&limit=1
//! upsert_by_email  PATCH /rest/v1/<table>?email=eq.<e>          (return=representation)
//!                  POST  /rest/v1/<table>?on_conflict=email     (only if PATCH matched nothing)
//! insert           POST  /rest/v1/<table>                       (return=representation)
//! list_all         GET   /rest/v1/<table>?select=*&order=created_at.asc
//! list             GET   /rest/v1/<table>?select=*&order=name.asc[&department=eq.<d>]
//! mark_all_synced  PATCH /rest/v1/<table>?id=not.is.null
//! append_sync_log  POST  /rest/v1/<log_table>
//! ```

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::json;

use staffsync_core::config::StoreConfig;
use staffsync_core::{EmployeeInsert, EmployeeRecord, EmployeeUpsert, SyncLogEntry};

use crate::error::StoreError;
use crate::store::{EmployeeFilter, RecordStore, UpsertOutcome};

const RETURN_REPRESENTATION: &str = "return=representation";
const RETURN_MINIMAL: &str = "return=minimal";
const MERGE_DUPLICATES: &str = "resolution=merge-duplicates,return=minimal";

#[derive(Serialize)]
struct UpsertInsertBody<'a> {
    #[serde(flatten)]
    fields: &'a EmployeeUpsert,
    created_at: DateTime<Utc>,
}

pub struct PostgrestStore {
    agent: ureq::Agent,
    rest_base: String,
    service_key: String,
    table: String,
    log_table: String,
}

impl PostgrestStore {
    pub fn new(config: &StoreConfig) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(Duration::from_secs(30))
            .build();
        Self {
            agent,
            rest_base: format!("{}/rest/v1", config.url.trim_end_matches('/')),
            service_key: config.service_role_key.clone(),
            table: config.table.clone(),
            log_table: config.log_table.clone(),
        }
    }

    fn request(&self, method: &str, table: &str) -> ureq::Request {
        self.agent
            .request(method, &format!("{}/{table}", self.rest_base))
            .set("apikey", &self.service_key)
            .set("Authorization", &format!("Bearer {}", self.service_key))
    }

    fn decode<T: DeserializeOwned>(response: ureq::Response, what: &str) -> Result<T, StoreError> {
        response
            .into_json()
            .map_err(|err| StoreError::Decode(format!("{what}: {err}")))
    }
}

impl RecordStore for PostgrestStore {
    fn find_by_email(&self, email: &str) -> Result<Option<EmployeeRecord>, StoreError> {
        let response = self
            .request("GET", &self.table)
            .query("select", "*")
            .query("email", &format!("eq.{email}"))
            .query("limit", "1")
            .call()?;
        let mut rows: Vec<EmployeeRecord> = Self::decode(response, "find_by_email")?;
        Ok(rows.pop())
    }

    fn upsert_by_email(&self, record: &EmployeeUpsert) -> Result<UpsertOutcome, StoreError> {
        let response = self
            .request("PATCH", &self.table)
            .query("email", &format!("eq.{}", record.email))
            .set("Prefer", RETURN_REPRESENTATION)
            .send_json(record)?;
        let updated: Vec<EmployeeRecord> = Self::decode(response, "upsert_by_email")?;
        if !updated.is_empty() {
            tracing::debug!("upsert {}: updated {} row(s)", record.email, updated.len());
            return Ok(UpsertOutcome::Updated);
        }

        // `on_conflict` keeps a concurrent insert of the same email from
        // producing a second row.
        let body = UpsertInsertBody {
            fields: record,
            created_at: record.updated_at,
        };
        self.request("POST", &self.table)
            .query("on_conflict", "email")
            .set("Prefer", MERGE_DUPLICATES)
            .send_json(&body)?;
        tracing::debug!("upsert {}: inserted", record.email);
        Ok(UpsertOutcome::Inserted)
    }

    fn insert(&self, record: &EmployeeInsert) -> Result<EmployeeRecord, StoreError> {
        let response = self
            .request("POST", &self.table)
            .set("Prefer", RETURN_REPRESENTATION)
            .send_json(record)
            .map_err(|err| match StoreError::from(err) {
                StoreError::Api { status: 409, .. } => StoreError::DuplicateEmail {
                    email: record.email.clone(),
                },
                other => other,
            })?;
        let mut rows: Vec<EmployeeRecord> = Self::decode(response, "insert")?;
        rows.pop()
            .ok_or_else(|| StoreError::Decode("insert returned no rows".to_string()))
    }

    fn list_all(&self) -> Result<Vec<EmployeeRecord>, StoreError> {
        let response = self
            .request("GET", &self.table)
            .query("select", "*")
            .query("order", "created_at.asc")
            .call()?;
        Self::decode(response, "list_all")
    }

    fn list(&self, filter: &EmployeeFilter) -> Result<Vec<EmployeeRecord>, StoreError> {
        let mut request = self
            .request("GET", &self.table)
            .query("select", "*")
            .query("order", "name.asc");
        if let Some(department) = &filter.department {
            request = request.query("department", &format!("eq.{department}"));
        }
        Self::decode(request.call()?, "list")
    }

    fn mark_all_synced(&self, at: DateTime<Utc>, source: &str) -> Result<(), StoreError> {
        self.request("PATCH", &self.table)
            .query("id", "not.is.null")
            .set("Prefer", RETURN_MINIMAL)
            .send_json(json!({
                "last_synced_at": at,
                "last_synced_from": source,
            }))?;
        tracing::debug!("marked every record synced at {at} from {source}");
        Ok(())
    }

    fn append_sync_log(&self, entry: &SyncLogEntry) -> Result<(), StoreError> {
        self.request("POST", &self.log_table)
            .set("Prefer", RETURN_MINIMAL)
            .send_json(entry)?;
        tracing::debug!("appended {:?} sync log entry to {}", entry.status, self.log_table);
        Ok(())
    }
}
