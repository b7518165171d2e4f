//! Tests for the Secure API client
//!
//! These tests verify:
//! - URL construction and query encoding
//! - Auth and JSON headers on every call
//! - Status and decode failures against a mock server

use super::*;
use crate::models::TimeRange;
use mockito::{Matcher, Server, ServerGuard};
use std::time::Duration;
use url::Url;

const TOKEN: &str = "test-token";

fn range() -> TimeRange {
    TimeRange {
        from: 1_714_000_000,
        to: 1_716_592_000,
    }
}

fn client_for(server: &ServerGuard) -> SecureClient {
    let base = Url::parse(&server.url()).unwrap();
    SecureClient::new(ClientConfig::with_base_url(base, TOKEN)).unwrap()
}

mod config_tests {
    use super::*;

    #[test]
    fn test_config_from_authority() {
        let config = ClientConfig::new("secure.example.com", TOKEN).unwrap();
        assert_eq!(config.base_url.as_str(), "https://secure.example.com/");
        assert_eq!(config.request_timeout, Duration::from_secs(3));
        assert_eq!(config.cluster_limit, 500);
        assert_eq!(config.agent_limit, 50);

        let config = ClientConfig::new("secure.example.com:8443", TOKEN).unwrap();
        assert_eq!(config.base_url.port(), Some(8443));
    }

    #[test]
    fn test_config_rejects_bad_authority() {
        for bad in ["", "   ", "secure.example.com/api", "host?x=1", "bad host"] {
            assert!(
                matches!(ClientConfig::new(bad, TOKEN), Err(ApiError::InvalidAuthority(_))),
                "'{}' should be rejected",
                bad
            );
        }
    }

    #[test]
    fn test_config_debug_redacts_token() {
        let config = ClientConfig::new("secure.example.com", "super-secret").unwrap();
        let debug = format!("{:?}", config);
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn test_invalid_token_rejected() {
        let config = ClientConfig::new("secure.example.com", "bad\ntoken").unwrap();
        assert!(matches!(SecureClient::new(config), Err(ApiError::InvalidToken)));
    }
}

mod url_tests {
    use super::*;

    fn client() -> SecureClient {
        SecureClient::new(ClientConfig::new("secure.example.com", TOKEN).unwrap()).unwrap()
    }

    #[test]
    fn test_cluster_filter_url_encoding() {
        let client = client();
        let url = client.url(
            Endpoint::ClusterFilter,
            &[
                ("from", "100".to_string()),
                ("to", "200".to_string()),
                ("filter", RUNTIME_FILTER.to_string()),
                ("limit", "500".to_string()),
            ],
        );

        assert_eq!(
            url.as_str(),
            "https://secure.example.com/api/secure-metrics/v1/vm-cve/filter/cluster\
             ?from=100&to=200&filter=context+%3D+%22runtime%22&limit=500"
        );
    }

    #[test]
    fn test_usage_filter_url_encoding() {
        let client = client();
        let url = client.url(
            Endpoint::UsageTimeseries,
            &[("filter", format!("{} and cluster in (\"prod-eu\")", RUNTIME_FILTER))],
        );

        assert_eq!(
            url.query(),
            Some("filter=context+%3D+%22runtime%22+and+cluster+in+%28%22prod-eu%22%29")
        );
    }

    const RUNTIME_FILTER: &str = "context = \"runtime\"";
}

mod request_tests {
    use super::*;

    #[tokio::test]
    async fn test_list_clusters_sends_auth_and_query() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", Endpoint::ClusterFilter.path())
            .match_header("authorization", "Bearer test-token")
            .match_header("accept", "application/json")
            .match_header("content-type", "application/json")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("from".into(), "1714000000".into()),
                Matcher::UrlEncoded("to".into(), "1716592000".into()),
                Matcher::UrlEncoded("filter".into(), "context = \"runtime\"".into()),
                Matcher::UrlEncoded("limit".into(), "500".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"values": ["prod-eu", "prod-us"]}"#)
            .create_async()
            .await;

        let clusters = client_for(&server).list_clusters(range()).await.unwrap();

        mock.assert_async().await;
        assert_eq!(clusters.values, vec!["prod-eu", "prod-us"]);
    }

    #[tokio::test]
    async fn test_usage_timeseries_filters_by_cluster() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", Endpoint::UsageTimeseries.path())
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("group".into(), "context".into()),
                Matcher::UrlEncoded(
                    "filter".into(),
                    "context = \"runtime\" and cluster in (\"prod-eu\")".into(),
                ),
            ]))
            .with_status(200)
            .with_body(
                r#"{"results": [{"series": [
                    {"value": 10, "pointInTime": "2024-05-01T00:00:00Z"},
                    {"value": 0, "pointInTime": "2024-05-02T00:00:00Z"}
                ]}]}"#,
            )
            .create_async()
            .await;

        let usage = client_for(&server)
            .usage_timeseries("prod-eu", range())
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(usage.results.len(), 1);
        assert_eq!(usage.results[0].values(), vec![10.0, 0.0]);
    }

    #[tokio::test]
    async fn test_agents_query() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", Endpoint::Agents.path())
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("limit".into(), "50".into()),
                Matcher::UrlEncoded("offset".into(), "0".into()),
                Matcher::UrlEncoded("filter".into(), "prod-eu".into()),
            ]))
            .with_status(200)
            .with_body(
                r#"{"details": [
                    {"clusterName": "prod-eu", "labels": {"hostname": "node-1"}, "agentStatus": "Healthy"},
                    {"clusterName": "prod-eu", "labels": {"hostname": "node-2"}, "agentStatus": "Unhealthy"}
                ]}"#,
            )
            .create_async()
            .await;

        let agents = client_for(&server).agents("prod-eu").await.unwrap();

        mock.assert_async().await;
        let hosts: Vec<_> = agents.details.iter().map(|a| a.labels.hostname.as_str()).collect();
        assert_eq!(hosts, vec!["node-1", "node-2"]);
    }

    #[tokio::test]
    async fn test_non_200_is_unexpected_status() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", Endpoint::ClusterFilter.path())
            .match_query(Matcher::Any)
            .with_status(401)
            .with_body(r#"{"message": "unauthorized"}"#)
            .create_async()
            .await;

        let err = client_for(&server).list_clusters(range()).await.unwrap_err();

        assert_eq!(err.status(), Some(401));
        assert!(matches!(
            err,
            ApiError::UnexpectedStatus {
                endpoint: Endpoint::ClusterFilter,
                ..
            }
        ));
        assert_eq!(err.to_string(), "Unexpected HTTP response status: 401");
    }

    #[tokio::test]
    async fn test_other_success_codes_are_unexpected() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", Endpoint::Agents.path())
            .match_query(Matcher::Any)
            .with_status(204)
            .create_async()
            .await;

        let err = client_for(&server).agents("prod-eu").await.unwrap_err();
        assert_eq!(err.status(), Some(204));
    }

    #[tokio::test]
    async fn test_redirects_are_followed() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", Endpoint::ClusterFilter.path())
            .match_query(Matcher::Any)
            .with_status(302)
            .with_header("location", "/moved/clusters")
            .create_async()
            .await;
        let moved = server
            .mock("GET", "/moved/clusters")
            .with_status(200)
            .with_body(r#"{"values": ["prod-eu"]}"#)
            .create_async()
            .await;

        let clusters = client_for(&server).list_clusters(range()).await.unwrap();

        moved.assert_async().await;
        assert_eq!(clusters.values, vec!["prod-eu"]);
    }

    #[tokio::test]
    async fn test_malformed_body_is_decode_error() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", Endpoint::Agents.path())
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{"items": []}"#)
            .create_async()
            .await;

        let err = client_for(&server).agents("prod-eu").await.unwrap_err();
        assert!(matches!(
            err,
            ApiError::Decode {
                endpoint: Endpoint::Agents,
                ..
            }
        ));
        assert!(!err.is_transport());
    }

    #[tokio::test]
    async fn test_connection_refused_is_transport_error() {
        // Nothing listens on port 1
        let base = Url::parse("http://127.0.0.1:1").unwrap();
        let config = ClientConfig::with_base_url(base, TOKEN).with_timeout(Duration::from_secs(1));
        let client = SecureClient::new(config).unwrap();

        let err = client.list_clusters(range()).await.unwrap_err();
        assert!(err.is_transport());
        assert_eq!(err.status(), None);
    }
}
