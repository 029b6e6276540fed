//! Full request → response runs against the mock backend over real HTTP.

use std::time::Duration;

use serde_json::{Value, json};
use spabridge_dispatch::Dispatcher;
use spabridge_gateway::{CloudAddress, HttpDeviceCloud, LwaTokenClient};
use spabridge_mockcloud::{MockCloud, MockCloudHandle};
use spabridge_types::Directive;

const TIMEOUT: Option<Duration> = Some(Duration::from_secs(5));

fn dispatcher_for(mock: &MockCloudHandle) -> Dispatcher {
    let cloud = HttpDeviceCloud::new(&mock.cloud_address(), TIMEOUT).unwrap();
    let tokens = LwaTokenClient::new(mock.token_url(), "client-id", "client-secret", TIMEOUT).unwrap();
    Dispatcher::new(Box::new(cloud), Box::new(tokens))
}

fn toggle(name: &str) -> Value {
    Directive::new("Alexa.ToggleController", name)
        .with_endpoint("spa_test_1", "0101")
        .with_instance("Spa.Lights")
        .with_correlation_token("corr-toggle")
        .into_request()
        .unwrap()
}

fn report_state(endpoint_id: &str) -> Value {
    Directive::new("Alexa", "ReportState")
        .with_endpoint(endpoint_id, "0101")
        .with_correlation_token("corr-report")
        .into_request()
        .unwrap()
}

#[test]
fn missing_directive_is_invalid_directive() {
    let mock = MockCloud::spawn().unwrap();
    let response = dispatcher_for(&mock).handle(&json!({ "hello": "world" }), None);

    assert_eq!(response["event"]["header"]["namespace"], "Alexa");
    assert_eq!(response["event"]["header"]["correlationToken"], "INVALID");
    assert_eq!(response["event"]["payload"]["type"], "INVALID_DIRECTIVE");
}

#[test]
fn wrong_payload_version_names_version_three() {
    let mock = MockCloud::spawn().unwrap();
    let mut request = toggle("TurnOn");
    request["directive"]["header"]["payloadVersion"] = json!("2");

    let response = dispatcher_for(&mock).handle(&request, None);
    assert_eq!(response["event"]["payload"]["type"], "INVALID_DIRECTIVE");
    assert!(response["event"]["payload"]["message"].as_str().unwrap().contains("version 3"));
}

#[test]
fn accept_grant_round_trip() {
    let mock = MockCloud::spawn().unwrap();
    let dispatcher = dispatcher_for(&mock);

    let ok = Directive::new("Alexa.Authorization", "AcceptGrant")
        .with_grant("auth-code", "grantee")
        .into_request()
        .unwrap();
    let response = dispatcher.handle(&ok, None);
    assert_eq!(response["event"]["header"]["name"], "AcceptGrant.Response");
    assert_eq!(response["event"]["payload"], json!({}));
    assert!(response["event"].get("endpoint").is_none());

    let rejected = Directive::new("Alexa.Authorization", "AcceptGrant")
        .with_grant("invalid", "grantee")
        .into_request()
        .unwrap();
    let response = dispatcher.handle(&rejected, None);
    assert_eq!(response["event"]["header"]["namespace"], "Alexa.Authorization");
    assert_eq!(response["event"]["payload"]["type"], "ACCEPT_GRANT_FAILED");
}

#[test]
fn discover_describes_seeded_spa() {
    let mock = MockCloud::spawn().unwrap();
    let request = Directive::new("Alexa.Discovery", "Discover")
        .with_payload_scope("0101")
        .into_request()
        .unwrap();

    let response = dispatcher_for(&mock).handle(&request, None);
    assert_eq!(response["event"]["header"]["name"], "Discover.Response");

    let endpoints = response["event"]["payload"]["endpoints"].as_array().unwrap();
    assert_eq!(endpoints.len(), 1);
    assert_eq!(endpoints[0]["endpointId"], "spa_test_1");
    assert_eq!(endpoints[0]["displayCategories"], json!(["OTHER"]));

    let toggle = endpoints[0]["capabilities"]
        .as_array()
        .unwrap()
        .iter()
        .find(|c| c["interface"] == "Alexa.ToggleController")
        .expect("toggle capability");
    assert_eq!(
        toggle["capabilityResources"]["friendlyNames"][0]["value"]["text"],
        "Lights"
    );
}

#[test]
fn discover_with_unknown_token_is_discovery_error() {
    let mock = MockCloud::spawn().unwrap();
    let request = Directive::new("Alexa.Discovery", "Discover")
        .with_payload_scope("not-a-token")
        .into_request()
        .unwrap();

    let response = dispatcher_for(&mock).handle(&request, None);
    assert_eq!(response["event"]["header"]["namespace"], "Alexa.Discovery");
    assert_eq!(response["event"]["header"]["name"], "Discovery.ErrorResponse");
    assert_eq!(response["event"]["payload"]["type"], "HTTP_ERROR");
}

#[test]
fn turn_on_then_off() {
    let mock = MockCloud::spawn().unwrap();
    let dispatcher = dispatcher_for(&mock);

    let on = dispatcher.handle(&toggle("TurnOn"), None);
    assert_eq!(on["event"]["header"]["name"], "Response");
    assert_eq!(on["event"]["header"]["correlationToken"], "corr-toggle");
    assert_eq!(on["event"]["endpoint"]["endpointId"], "spa_test_1");
    assert_eq!(on["context"]["properties"][0]["value"], "On");
    assert_eq!(on["context"]["properties"][0]["instance"], "Spa.Lights");

    let off = dispatcher.handle(&toggle("TurnOff"), None);
    assert_ne!(off["context"]["properties"][0]["value"], "On");
}

#[test]
fn report_state_reports_lights_off() {
    let mock = MockCloud::spawn().unwrap();
    let response = dispatcher_for(&mock).handle(&report_state("spa_test_2"), None);

    assert_eq!(response["event"]["header"]["name"], "StateReport");
    assert_eq!(response["event"]["header"]["correlationToken"], "corr-report");

    let properties = response["context"]["properties"].as_array().unwrap();
    assert_eq!(properties.len(), 1);
    assert_eq!(properties[0]["namespace"], "Alexa.ToggleController");
    assert_eq!(properties[0]["instance"], "Spa.Lights");
    assert_eq!(properties[0]["name"], "toggleState");
    assert_eq!(properties[0]["value"], "Off");
    assert!(properties[0]["timeOfSample"].is_string());
}

#[test]
fn report_state_against_dead_cloud_is_endpoint_unreachable() {
    let dead = CloudAddress::new("http", "127.0.0.1", "9");
    let cloud = HttpDeviceCloud::new(&dead, TIMEOUT).unwrap();
    let tokens = LwaTokenClient::new("http://127.0.0.1:9/auth/o2/token", "", "", TIMEOUT).unwrap();
    let dispatcher = Dispatcher::new(Box::new(cloud), Box::new(tokens));

    let response = dispatcher.handle(&report_state("spa_test_1"), None);
    assert_eq!(response["event"]["header"]["name"], "ErrorResponse");
    assert_eq!(response["event"]["payload"]["type"], "ENDPOINT_UNREACHABLE");
    assert_eq!(response["event"]["header"]["correlationToken"], "corr-report");
}

#[test]
fn unrouted_directive_is_invalid_directive() {
    let mock = MockCloud::spawn().unwrap();
    let request = Directive::new("Alexa.PowerController", "TurnOn")
        .with_endpoint("spa_test_1", "0101")
        .into_request()
        .unwrap();

    let response = dispatcher_for(&mock).handle(&request, None);
    assert_eq!(response["event"]["header"]["namespace"], "Alexa");
    assert_eq!(response["event"]["payload"]["type"], "INVALID_DIRECTIVE");
}
