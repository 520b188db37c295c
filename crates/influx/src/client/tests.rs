use super::*;
use anyhow::Result;
use common::types::Field;
use mockito::Matcher;

fn config_for(url: String) -> InfluxConfig {
    InfluxConfig {
        url,
        token: "secret-token".to_string(),
        org: "angstromlab".to_string(),
        ..InfluxConfig::default()
    }
}

const BODY: &str = "\
#datatype,string,long,dateTime:RFC3339,double,string,string,string
#group,false,false,false,false,true,true,true
#default,_result,,,,,,
,result,table,_time,_value,_field,_measurement,host
,,0,2024-05-02T09:00:00.001Z,17.5,voltage,mppt,ttgo1
,,1,2024-05-02T09:00:00.001Z,0.5,current,mppt,ttgo1
";

#[tokio::test]
async fn test_query_success() -> Result<()> {
    let mut server = mockito::Server::new_async().await;
    let query = FluxQuery::new("rooftop", "mppt");

    let mock = server
        .mock("POST", "/api/v2/query")
        .match_query(Matcher::UrlEncoded("org".into(), "angstromlab".into()))
        .match_header("authorization", "Token secret-token")
        .match_header("accept", "application/csv")
        .match_body(Matcher::PartialJson(serde_json::json!({
            "query": query.to_flux(),
            "type": "flux",
            "dialect": { "header": true },
        })))
        .with_status(200)
        .with_header("content-type", "text/csv; charset=utf-8")
        .with_body(BODY)
        .create_async()
        .await;

    let client = InfluxClient::new(&config_for(server.url()))?;
    let samples = client.query(&query).await?;

    mock.assert_async().await;
    assert_eq!(samples.len(), 2);
    assert_eq!(samples[0].field, Field::Voltage);
    assert_eq!(samples[1].field, Field::Current);
    assert_eq!(samples[1].host, "ttgo1");

    Ok(())
}

#[tokio::test]
async fn test_query_http_error_uses_influx_message() -> Result<()> {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/api/v2/query")
        .match_query(Matcher::Any)
        .with_status(401)
        .with_header("content-type", "application/json")
        .with_body(r#"{"code":"unauthorized","message":"unauthorized access"}"#)
        .create_async()
        .await;

    let client = InfluxClient::new(&config_for(server.url()))?;
    let result = client.query(&FluxQuery::new("rooftop", "mppt")).await;

    match result {
        Err(InfluxError::Http { status, message }) => {
            assert_eq!(status, 401);
            assert_eq!(message, "unauthorized access");
        }
        other => panic!("unexpected result: {:?}", other),
    }

    Ok(())
}

#[tokio::test]
async fn test_query_http_error_plain_body() -> Result<()> {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/api/v2/query")
        .match_query(Matcher::Any)
        .with_status(502)
        .with_body("Bad Gateway")
        .create_async()
        .await;

    let client = InfluxClient::new(&config_for(server.url()))?;
    let err = client
        .query(&FluxQuery::new("rooftop", "mppt"))
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "HTTP Error 502: Bad Gateway");

    Ok(())
}

#[tokio::test]
async fn test_query_error_table_in_ok_response() -> Result<()> {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/api/v2/query")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body("#datatype,string,string\n#group,true,true\n#default,,\n,error,reference\n,panic: boom,\n")
        .create_async()
        .await;

    let client = InfluxClient::new(&config_for(server.url()))?;
    let err = client
        .query(&FluxQuery::new("rooftop", "sweep"))
        .await
        .unwrap_err();

    assert!(matches!(err, InfluxError::Query(ref m) if m == "panic: boom"));

    Ok(())
}

#[tokio::test]
async fn test_connection_refused_is_request_error() {
    // 誰も待ち受けていないポート
    let client = InfluxClient::new(&config_for("http://127.0.0.1:1".to_string())).unwrap();
    let err = client
        .query(&FluxQuery::new("rooftop", "mppt"))
        .await
        .unwrap_err();
    assert!(matches!(err, InfluxError::Request(_)));
}

#[test]
fn test_new_rejects_missing_token() {
    let config = InfluxConfig {
        org: "lab".to_string(),
        ..InfluxConfig::default()
    };
    let result = InfluxClient::new(&config);
    assert!(matches!(result, Err(InfluxError::Config(_))));
}

#[test]
fn test_new_rejects_bad_timeout() {
    let config = InfluxConfig {
        timeout: "forever".to_string(),
        ..config_for("http://localhost:8086".to_string())
    };
    assert!(matches!(
        InfluxClient::new(&config),
        Err(InfluxError::Config(_))
    ));
}

#[test]
fn test_normalize_base_url() {
    assert_eq!(
        normalize_base_url("192.168.3.140:8086"),
        "http://192.168.3.140:8086"
    );
    assert_eq!(
        normalize_base_url("https://influx.example.com/"),
        "https://influx.example.com"
    );
    assert_eq!(
        normalize_base_url(" http://localhost:8086 "),
        "http://localhost:8086"
    );
}

#[test]
fn test_base_url_accessor() {
    let client = InfluxClient::new(&config_for("localhost:8086".to_string())).unwrap();
    assert_eq!(client.base_url(), "http://localhost:8086");
}
