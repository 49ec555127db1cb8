mod common;

use std::time::Duration;

use common::{asset_zip, WASHER_ID};
use hc_profile_core::auth::{
    self, derive_code_challenge, AuthSession, NavigationDecision, Region, RegionEndpoints,
};
use hc_profile_core::client::HomeConnectClient;
use hc_profile_core::config::Config;
use hc_profile_core::emit::OutputTarget;
use hc_profile_core::pipeline;
use serde_json::{json, Value};
use tempfile::tempdir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn mount_provider(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/security/oauth/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access_token": "live-token"})))
        .expect(1)
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/account/details"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {"homeAppliances": [{
                "identifier": WASHER_ID,
                "type": "Washer",
                "serialnumber": "123456789012345678",
                "brand": "SIEMENS",
                "vib": "WM14T6H9NL",
                "mac": "68-A4-0E-00-00-01",
                "aes": {"key": "washer-aes-key", "iv": "washer-aes-iv"}
            }]}
        })))
        .expect(1)
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("/api/iddf/v1/iddf/{WASHER_ID}")))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(asset_zip(WASHER_ID)))
        .expect(1)
        .mount(server)
        .await;
}

fn query_param(url: &url::Url, name: &str) -> String {
    url.query_pairs()
        .find(|(k, _)| k == name)
        .map(|(_, v)| v.into_owned())
        .unwrap_or_else(|| panic!("{name} missing from {url}"))
}

#[tokio::test]
async fn test_login_redirect_drives_the_whole_pipeline() {
    let server = MockServer::start().await;
    mount_provider(&server).await;
    let out = tempdir().unwrap();

    let session = AuthSession::with_endpoints(
        Region::Eu,
        RegionEndpoints::new(server.uri(), server.uri()),
        OutputTarget::Hcpy,
    );
    let authorize = session.authorization_url().unwrap();
    assert!(authorize.as_str().starts_with(&format!("{}/security/oauth/authorize?", server.uri())));
    let challenge = query_param(&authorize, "code_challenge");
    let state = query_param(&authorize, "state");
    assert_eq!(state, session.state());

    // the embedded browser reports navigations from its own thread
    let (hook, interceptor) = auth::intercept::channel();
    let browser = std::thread::spawn(move || {
        [
            hook.on_before_request("https://singlekey-id.com/auth/login"),
            hook.on_before_request(&format!("hcauth://auth/prod?code=auth-code-1&state={state}")),
        ]
    });
    let code = interceptor
        .wait_for_code(Duration::from_secs(5))
        .await
        .expect("redirect captured");
    assert_eq!(
        browser.join().unwrap(),
        [NavigationDecision::Allow, NavigationDecision::Cancel]
    );
    assert_eq!(code, "auth-code-1");

    let config = Config {
        output_dir: out.path().to_path_buf(),
        ..Config::default()
    };
    let client = HomeConnectClient::new(config.http_timeout()).unwrap();
    let report = pipeline::run(&client, session, &code, &config)
        .await
        .expect("pipeline succeeds");
    assert_eq!(report.appliances, 1);

    // the verifier sent with the token request hashes to the advertised challenge
    let requests = server.received_requests().await.expect("recording enabled");
    let token_request = requests
        .iter()
        .find(|r| r.url.path() == "/security/oauth/token")
        .expect("token request sent");
    let form: Vec<(String, String)> = url::form_urlencoded::parse(&token_request.body)
        .into_owned()
        .collect();
    let field = |name: &str| {
        form.iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.clone())
            .unwrap_or_default()
    };
    assert_eq!(field("code"), "auth-code-1");
    assert_eq!(derive_code_challenge(&field("code_verifier")), challenge);

    let account_request = requests
        .iter()
        .find(|r| r.url.path() == "/account/details")
        .expect("account request sent");
    assert_eq!(
        account_request.headers.get("authorization").unwrap(),
        "Bearer live-token"
    );

    let devices: Value =
        serde_json::from_slice(&std::fs::read(&report.artifacts[0]).unwrap()).unwrap();
    assert_eq!(devices[0]["iv"], "washer-aes-iv");
    assert_eq!(devices[0]["features"]["513"]["values"]["0"], "Open");
}

#[tokio::test]
async fn test_wrong_region_surfaces_hint() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/security/oauth/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access_token": "t"})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/account/details"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;
    let out = tempdir().unwrap();

    let session = AuthSession::with_endpoints(
        Region::Na,
        RegionEndpoints::new(server.uri(), server.uri()),
        OutputTarget::HomeConnectDirect,
    );
    let config = Config {
        output_dir: out.path().join("never"),
        ..Config::default()
    };
    let client = HomeConnectClient::new(config.http_timeout()).unwrap();
    let err = pipeline::run(&client, session, "code", &config)
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "Wrong region used! Try a different region.");
    assert!(!config.output_dir.exists());
}
