//! Neo4j connectivity check. `bolt://` and `neo4j://` URIs go over Bolt,
//! `http(s)://` URIs over the HTTP transactional endpoint.

use crate::utils::error::{LabError, Result};
use crate::utils::validation::{self, Validate};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::time::Duration;

pub const DEFAULT_DATABASE: &str = "neo4j";

const BOLT_SCHEMES: &[&str] = &["bolt", "bolt+s", "bolt+ssc", "neo4j", "neo4j+s", "neo4j+ssc"];
const URI_SCHEMES: &[&str] = &[
    "http", "https", "bolt", "bolt+s", "bolt+ssc", "neo4j", "neo4j+s", "neo4j+ssc",
];

#[derive(Debug, Clone)]
pub struct Neo4jConfig {
    pub uri: String,
    pub user: String,
    pub password: String,
    pub database: String,
}

impl Neo4jConfig {
    /// Reads `NEO4J_URI`, `NEO4J_USER`, `NEO4J_PASS` and `NEO4J_DATABASE`,
    /// loading a `.env` file from the working directory first if present.
    pub fn from_env() -> Result<Self> {
        if let Ok(path) = dotenvy::dotenv() {
            tracing::debug!("Loaded environment from {}", path.display());
        }
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |name: &str| lookup(name).filter(|v| !v.is_empty());
        let uri = var("NEO4J_URI");
        let user = var("NEO4J_USER");
        let password = var("NEO4J_PASS");

        Ok(Self {
            uri: validation::validate_required_field("NEO4J_URI", &uri)?.clone(),
            user: validation::validate_required_field("NEO4J_USER", &user)?.clone(),
            password: validation::validate_required_field("NEO4J_PASS", &password)?.clone(),
            database: var("NEO4J_DATABASE").unwrap_or_else(|| DEFAULT_DATABASE.to_string()),
        })
    }

    pub fn is_bolt(&self) -> bool {
        url::Url::parse(&self.uri)
            .map(|url| BOLT_SCHEMES.contains(&url.scheme()))
            .unwrap_or(false)
    }
}

impl Validate for Neo4jConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_url_scheme("NEO4J_URI", &self.uri, URI_SCHEMES)?;
        validation::validate_non_empty_string("NEO4J_USER", &self.user)?;
        validation::validate_non_empty_string("NEO4J_DATABASE", &self.database)?;
        Ok(())
    }
}

#[derive(Debug, Serialize)]
struct Statement<'a> {
    statement: &'a str,
}

#[derive(Debug, Serialize)]
struct CommitRequest<'a> {
    statements: Vec<Statement<'a>>,
}

#[derive(Debug, Deserialize)]
pub struct QueryResult {
    pub columns: Vec<String>,
    pub data: Vec<QueryRow>,
}

#[derive(Debug, Deserialize)]
pub struct QueryRow {
    pub row: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct ServerError {
    code: String,
    message: String,
}

#[derive(Debug, Deserialize)]
struct CommitResponse {
    #[serde(default)]
    results: Vec<QueryResult>,
    #[serde(default)]
    errors: Vec<ServerError>,
}

fn graph_error(err: impl Display) -> LabError {
    LabError::GraphError {
        message: err.to_string(),
    }
}

enum Transport {
    Http(Client),
    Bolt(neo4rs::Graph),
}

pub struct Neo4jClient {
    transport: Transport,
    config: Neo4jConfig,
}

impl Neo4jClient {
    pub async fn connect(config: Neo4jConfig) -> Result<Self> {
        config.validate()?;
        let transport = if config.is_bolt() {
            let bolt = neo4rs::ConfigBuilder::default()
                .uri(config.uri.as_str())
                .user(config.user.as_str())
                .password(config.password.as_str())
                .db(config.database.as_str())
                .build()
                .map_err(graph_error)?;
            Transport::Bolt(neo4rs::Graph::connect(bolt).await.map_err(graph_error)?)
        } else {
            Transport::Http(Client::builder().timeout(Duration::from_secs(15)).build()?)
        };
        Ok(Self { transport, config })
    }

    /// Runs a single Cypher statement in an auto-committed transaction.
    /// Over Bolt the statement runs for its effects and no rows are returned.
    pub async fn run(&self, statement: &str) -> Result<QueryResult> {
        match &self.transport {
            Transport::Http(client) => self.run_http(client, statement).await,
            Transport::Bolt(graph) => {
                tracing::debug!("BOLT {}: {}", self.config.uri, statement);
                graph
                    .run(neo4rs::query(statement))
                    .await
                    .map_err(graph_error)?;
                Ok(QueryResult {
                    columns: Vec::new(),
                    data: Vec::new(),
                })
            }
        }
    }

    async fn run_http(&self, client: &Client, statement: &str) -> Result<QueryResult> {
        let url = format!(
            "{}/db/{}/tx/commit",
            self.config.uri.trim_end_matches('/'),
            self.config.database
        );
        let body = CommitRequest {
            statements: vec![Statement { statement }],
        };

        tracing::debug!("POST {}: {}", url, statement);
        let response = client
            .post(&url)
            .basic_auth(&self.config.user, Some(&self.config.password))
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(LabError::GraphError {
                message: format!("HTTP {}: {}", status.as_u16(), text),
            });
        }

        let parsed: CommitResponse = response.json().await?;
        if let Some(err) = parsed.errors.first() {
            return Err(LabError::GraphError {
                message: format!("{}: {}", err.code, err.message),
            });
        }

        parsed.results.into_iter().next().ok_or_else(|| LabError::GraphError {
            message: "server returned no result set".to_string(),
        })
    }

    /// `RETURN 1 AS ok`; returns the `ok` value.
    pub async fn ping(&self) -> Result<i64> {
        let ok = match &self.transport {
            Transport::Http(client) => {
                let result = self.run_http(client, "RETURN 1 AS ok").await?;
                result
                    .data
                    .first()
                    .and_then(|r| r.row.first())
                    .and_then(|v| v.as_i64())
            }
            Transport::Bolt(graph) => {
                let mut rows = graph
                    .execute(neo4rs::query("RETURN 1 AS ok"))
                    .await
                    .map_err(graph_error)?;
                match rows.next().await.map_err(graph_error)? {
                    Some(row) => row.get::<i64>("ok").ok(),
                    None => None,
                }
            }
        };
        ok.ok_or_else(|| LabError::GraphError {
            message: "unexpected ping response".to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(uri: &str) -> Neo4jConfig {
        Neo4jConfig {
            uri: uri.to_string(),
            user: "neo4j".to_string(),
            password: "secret".to_string(),
            database: DEFAULT_DATABASE.to_string(),
        }
    }

    fn vars(pairs: &'static [(&'static str, &'static str)]) -> impl Fn(&str) -> Option<String> {
        move |key: &str| {
            pairs
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| v.to_string())
        }
    }

    #[test]
    fn test_uri_schemes() {
        for uri in ["bolt://localhost:7687", "neo4j://localhost:7687", "neo4j+s://db.example.com"] {
            let config = config(uri);
            assert!(config.validate().is_ok(), "{}", uri);
            assert!(config.is_bolt(), "{}", uri);
        }
        let http = config("http://localhost:7474");
        assert!(http.validate().is_ok());
        assert!(!http.is_bolt());

        let err = config("ftp://localhost:21").validate().unwrap_err();
        assert!(matches!(err, LabError::InvalidConfigValueError { .. }));
    }

    #[tokio::test]
    async fn test_connect_rejects_invalid_uri() {
        let err = Neo4jClient::connect(config("localhost:7687")).await.err().unwrap();
        assert!(matches!(err, LabError::InvalidConfigValueError { .. }));
        assert!(Neo4jClient::connect(config("http://localhost:7474")).await.is_ok());
    }

    #[test]
    fn test_config_from_lookup() {
        let config = Neo4jConfig::from_lookup(vars(&[
            ("NEO4J_URI", "bolt://localhost:7687"),
            ("NEO4J_USER", "neo4j"),
            ("NEO4J_PASS", "secret"),
        ]))
        .unwrap();
        assert_eq!(config.uri, "bolt://localhost:7687");
        assert_eq!(config.database, DEFAULT_DATABASE);

        let config = Neo4jConfig::from_lookup(vars(&[
            ("NEO4J_URI", "http://localhost:7474"),
            ("NEO4J_USER", "neo4j"),
            ("NEO4J_PASS", "secret"),
            ("NEO4J_DATABASE", "strava"),
        ]))
        .unwrap();
        assert_eq!(config.database, "strava");
    }

    #[test]
    fn test_config_from_lookup_missing_vars() {
        let cases: [(&'static [(&'static str, &'static str)], &str); 3] = [
            (&[("NEO4J_USER", "neo4j"), ("NEO4J_PASS", "secret")], "NEO4J_URI"),
            (&[("NEO4J_URI", "bolt://localhost:7687"), ("NEO4J_PASS", "secret")], "NEO4J_USER"),
            (&[("NEO4J_URI", "bolt://localhost:7687"), ("NEO4J_USER", ""), ("NEO4J_PASS", "x")], "NEO4J_USER"),
        ];
        for (pairs, missing) in cases {
            match Neo4jConfig::from_lookup(vars(pairs)) {
                Err(LabError::MissingConfigError { field }) => assert_eq!(field, missing),
                other => panic!("expected missing {}, got {:?}", missing, other),
            }
        }
    }
}
