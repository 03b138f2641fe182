//! PostgREST (Supabase-style) store adapter.
//!
//! Each query is one `GET /rest/v1/{table}` with `select` and `eq.` filters.

use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use reqwest::Url;
use tracing::instrument;

use credtrack_core::error::StoreError;
use credtrack_core::model::{
    AcademicYearId, Attendance, Enrollment, Exemption, Portfolio, StudentId, WorkExperience,
};
use credtrack_core::traits::{CreditStore, Query};

const DEFAULT_TIMEOUT_SECS: u64 = 30;

const ENROLLMENTS_SELECT: &str =
    "student_id,subject_id,credits_earned,term,subjects(id,name,credit_value,type)";
const WORK_EXPERIENCE_SELECT: &str = "student_id,credits_earned";
const PORTFOLIO_SELECT: &str = "student_id,academic_year_id,period,credits_earned";
const ATTENDANCE_SELECT: &str = "student_id,period,credits_earned";
const EXEMPTIONS_SELECT: &str = "student_id,subject_id";

/// Store adapter talking to a PostgREST endpoint.
pub struct RestStore {
    api_key: String,
    base_url: String,
    timeout: Duration,
    client: reqwest::Client,
}

impl RestStore {
    pub fn new(base_url: &str, api_key: &str) -> Result<Self, StoreError> {
        Self::with_timeout(base_url, api_key, Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    /// Build a store whose HTTP client gives up after `timeout`.
    pub fn with_timeout(
        base_url: &str,
        api_key: &str,
        timeout: Duration,
    ) -> Result<Self, StoreError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| StoreError::Unavailable(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            api_key: api_key.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
            client,
        })
    }

    fn url(
        &self,
        table: &str,
        select: &str,
        filters: &[(&str, String)],
    ) -> Result<Url, StoreError> {
        let params = std::iter::once(("select".to_string(), select.to_string())).chain(
            filters
                .iter()
                .map(|(column, value)| (column.to_string(), format!("eq.{value}"))),
        );
        Url::parse_with_params(&format!("{}/rest/v1/{}", self.base_url, table), params)
            .map_err(|e| StoreError::Unavailable(format!("invalid store URL: {e}")))
    }

    #[instrument(skip(self, select, filters), fields(store = "rest"))]
    async fn fetch<T: DeserializeOwned>(
        &self,
        query: Query,
        table: &str,
        select: &str,
        filters: &[(&str, String)],
    ) -> Result<Vec<T>, StoreError> {
        let response = self
            .client
            .get(self.url(table, select, filters)?)
            .header("apikey", &self.api_key)
            .header("authorization", format!("Bearer {}", self.api_key))
            .header("accept", "application/json")
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    StoreError::Timeout {
                        query,
                        after_ms: self.timeout.as_millis() as u64,
                    }
                } else {
                    StoreError::Unavailable(e.to_string())
                }
            })?;

        let status = response.status().as_u16();
        if status == 401 || status == 403 {
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::AuthenticationFailed(body));
        }
        if status == 503 {
            return Err(StoreError::Unavailable(format!("{table} returned HTTP 503")));
        }
        if status >= 400 {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<PostgrestError>(&body)
                .map(|e| e.message)
                .unwrap_or(body);
            return Err(StoreError::Failed {
                query,
                message: format!("HTTP {status}: {message}"),
            });
        }

        response
            .json::<Vec<T>>()
            .await
            .map_err(|e| StoreError::Decode {
                query,
                message: e.to_string(),
            })
    }
}

#[derive(Deserialize)]
struct PostgrestError {
    message: String,
}

#[async_trait]
impl CreditStore for RestStore {
    fn name(&self) -> &str {
        "rest"
    }

    async fn enrollments(&self, student: StudentId) -> Result<Vec<Enrollment>, StoreError> {
        self.fetch(
            Query::Enrollments,
            "enrollments",
            ENROLLMENTS_SELECT,
            &[("student_id", student.to_string())],
        )
        .await
    }

    async fn work_experience(
        &self,
        student: StudentId,
    ) -> Result<Vec<WorkExperience>, StoreError> {
        self.fetch(
            Query::WorkExperience,
            "work_experience",
            WORK_EXPERIENCE_SELECT,
            &[("student_id", student.to_string())],
        )
        .await
    }

    async fn portfolio(
        &self,
        student: StudentId,
        year: AcademicYearId,
    ) -> Result<Vec<Portfolio>, StoreError> {
        self.fetch(
            Query::Portfolio,
            "portfolios",
            PORTFOLIO_SELECT,
            &[
                ("student_id", student.to_string()),
                ("academic_year_id", year.to_string()),
            ],
        )
        .await
    }

    async fn attendance(&self, student: StudentId) -> Result<Vec<Attendance>, StoreError> {
        self.fetch(
            Query::Attendance,
            "attendance",
            ATTENDANCE_SELECT,
            &[("student_id", student.to_string())],
        )
        .await
    }

    async fn exemptions(&self, student: StudentId) -> Result<Vec<Exemption>, StoreError> {
        self.fetch(
            Query::Exemptions,
            "subject_exemptions",
            EXEMPTIONS_SELECT,
            &[("student_id", student.to_string())],
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn fetches_enrollments_with_joined_subject() {
        let server = MockServer::start().await;

        let body = serde_json::json!([
            {
                "student_id": 7,
                "subject_id": 3,
                "credits_earned": 8,
                "term": "Term 1",
                "subjects": {"id": 3, "name": "Maths", "credit_value": 10, "type": "core"}
            }
        ]);

        Mock::given(method("GET"))
            .and(path("/rest/v1/enrollments"))
            .and(query_param("student_id", "eq.7"))
            .and(header("apikey", "test-key"))
            .and(header("authorization", "Bearer test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(&body))
            .mount(&server)
            .await;

        let store = RestStore::new(&server.uri(), "test-key").unwrap();
        let rows = store.enrollments(StudentId(7)).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].credit_value(), 10);
        assert_eq!(rows[0].credits_earned, Some(8));
    }

    #[tokio::test]
    async fn portfolio_filters_by_academic_year() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/rest/v1/portfolios"))
            .and(query_param("student_id", "eq.7"))
            .and(query_param("academic_year_id", "eq.2024"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                {"student_id": 7, "academic_year_id": 2024, "period": "Term 2", "credits_earned": 15}
            ])))
            .mount(&server)
            .await;

        let store = RestStore::new(&server.uri(), "test-key").unwrap();
        let rows = store
            .portfolio(StudentId(7), AcademicYearId(2024))
            .await
            .unwrap();
        assert_eq!(rows[0].period.as_deref(), Some("Term 2"));
    }

    #[tokio::test]
    async fn authentication_failure() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/rest/v1/attendance"))
            .respond_with(ResponseTemplate::new(401).set_body_string("invalid api key"))
            .mount(&server)
            .await;

        let store = RestStore::new(&server.uri(), "bad-key").unwrap();
        let err = store.attendance(StudentId(1)).await.unwrap_err();
        assert!(matches!(err, StoreError::AuthenticationFailed(_)));
        assert!(err.to_string().contains("authentication"));
    }

    #[tokio::test]
    async fn postgrest_error_message_is_surfaced() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/rest/v1/subject_exemptions"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "code": "42P01",
                "message": "relation \"subject_exemptions\" does not exist"
            })))
            .mount(&server)
            .await;

        let store = RestStore::new(&server.uri(), "test-key").unwrap();
        let err = store.exemptions(StudentId(1)).await.unwrap_err();
        assert_eq!(err.query(), Some(Query::Exemptions));
        assert!(err.to_string().contains("does not exist"));
        assert!(err.to_string().contains("HTTP 400"));
    }

    #[tokio::test]
    async fn malformed_rows_are_a_decode_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/rest/v1/work_experience"))
            .respond_with(ResponseTemplate::new(200).set_body_string("{\"not\": \"a list\"}"))
            .mount(&server)
            .await;

        let store = RestStore::new(&server.uri(), "test-key").unwrap();
        let err = store.work_experience(StudentId(1)).await.unwrap_err();
        assert!(matches!(
            err,
            StoreError::Decode {
                query: Query::WorkExperience,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn slow_response_times_out() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/rest/v1/attendance"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!([]))
                    .set_delay(Duration::from_millis(500)),
            )
            .mount(&server)
            .await;

        let store =
            RestStore::with_timeout(&server.uri(), "test-key", Duration::from_millis(50)).unwrap();
        let err = store.attendance(StudentId(1)).await.unwrap_err();
        assert!(matches!(
            err,
            StoreError::Timeout {
                query: Query::Attendance,
                after_ms: 50
            }
        ));
    }

    #[test]
    fn url_includes_select_and_filters() {
        let store = RestStore::new("http://db.local/", "k").unwrap();
        let url = store
            .url("attendance", ATTENDANCE_SELECT, &[("student_id", "3".into())])
            .unwrap();
        assert_eq!(url.path(), "/rest/v1/attendance");
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert_eq!(
            pairs,
            vec![
                ("select".to_string(), ATTENDANCE_SELECT.to_string()),
                ("student_id".to_string(), "eq.3".to_string()),
            ]
        );
    }

    #[test]
    fn filter_values_are_encoded() {
        let store = RestStore::new("http://db.local", "k").unwrap();
        let url = store
            .url("portfolios", PORTFOLIO_SELECT, &[("period", "Term 1&x=1".into())])
            .unwrap();
        let query = url.query().unwrap();
        assert!(!query.contains("&x=1"));
        assert!(url
            .query_pairs()
            .any(|(k, v)| k == "period" && v == "eq.Term 1&x=1"));
    }

    #[tokio::test]
    async fn joined_select_survives_encoding() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/rest/v1/enrollments"))
            .and(query_param("select", ENROLLMENTS_SELECT))
            .and(query_param("student_id", "eq.2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
            .expect(1)
            .mount(&server)
            .await;

        let store = RestStore::new(&server.uri(), "test-key").unwrap();
        assert!(store.enrollments(StudentId(2)).await.unwrap().is_empty());
    }
}
