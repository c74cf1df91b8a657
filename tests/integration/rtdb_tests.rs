//! MonitorService publishing through the real RtdbClient and TokenManager,
//! with a fake Firebase behind the HttpClient seam.

use crate::mock_hw::{FakeFirebase, RecordingSink};

use aquasense::app::events::AppEvent;
use aquasense::app::service::MonitorService;
use aquasense::config::SystemConfig;
use aquasense::rtdb::{DbError, Method, RtdbClient, SignInAccount, TokenStatus};

const DB_URL: &str = "https://demo-default-rtdb.firebaseio.com";

fn account() -> SignInAccount {
    SignInAccount {
        api_key: "AIzaTEST",
        email: "monitor@example.com",
        password: "hunter22",
    }
}

fn setup(http: FakeFirebase) -> (MonitorService, RtdbClient<FakeFirebase>, RecordingSink) {
    let config = SystemConfig::default();
    let db = RtdbClient::new(http, DB_URL, account(), config.token_refresh_margin_secs);
    (MonitorService::new(config), db, RecordingSink::new())
}

#[test]
fn first_publish_signs_in_then_writes_four_fields() {
    let (mut svc, mut db, mut sink) = setup(FakeFirebase::new());

    let report = svc.publish(0, &mut db, &mut sink).expect("ready");
    assert!(report.all_ok());

    let http = db.http();
    assert_eq!(http.sign_ins(), 1);
    let sign_in = &http.requests[0];
    assert_eq!(sign_in.method, Method::Post);
    assert!(sign_in.url.ends_with("accounts:signInWithPassword?key=AIzaTEST"));
    assert!(sign_in.body.contains(r#""email":"monitor@example.com""#));
    assert!(sign_in.body.contains(r#""returnSecureToken":true"#));

    let puts: Vec<_> = http.puts().iter().map(|r| (r.url.as_str(), r.body.as_str())).collect();
    assert_eq!(
        puts,
        vec![
            (
                "https://demo-default-rtdb.firebaseio.com/test/string.json?auth=token-1",
                "\"value_0\""
            ),
            ("https://demo-default-rtdb.firebaseio.com/test/int.json?auth=token-1", "\"0\""),
            ("https://demo-default-rtdb.firebaseio.com/test/temp.json?auth=token-1", "\"0\""),
            (
                "https://demo-default-rtdb.firebaseio.com/test/flowread.json?auth=token-1",
                "\"0.00\""
            ),
        ]
    );

    assert_eq!(
        sink.token_statuses(),
        vec![TokenStatus::Signing, TokenStatus::Requesting, TokenStatus::Ready]
    );
}

#[test]
fn valid_token_is_reused_across_cycles() {
    let (mut svc, mut db, mut sink) = setup(FakeFirebase::new());

    for now in [0, 10_000, 20_000, 30_000] {
        svc.publish(now, &mut db, &mut sink);
    }

    assert_eq!(db.http().sign_ins(), 1);
    assert_eq!(db.http().refreshes(), 0);
    assert_eq!(db.http().puts().len(), 16);
    assert_eq!(sink.token_statuses().len(), 3);
}

#[test]
fn revoked_token_still_attempts_every_write_then_signs_in_again() {
    let (mut svc, mut db, mut sink) = setup(FakeFirebase::new());
    svc.publish(0, &mut db, &mut sink);

    db.http_mut().revoked.push("token-1".into());
    let report = svc.publish(10_000, &mut db, &mut sink).expect("token looked valid");

    assert_eq!(report.failures().count(), 4);
    assert!(report.failures().all(|w| w.result == Err(DbError::Unauthorized)));
    assert_eq!(db.http().puts().len(), 8);
    assert_eq!(db.http().sign_ins(), 1);

    let report = svc.publish(20_000, &mut db, &mut sink).expect("signed in again");
    assert!(report.all_ok());
    assert_eq!(report.sequence, 2);
    assert_eq!(db.http().sign_ins(), 2);
    assert!(db
        .http()
        .puts()
        .last()
        .is_some_and(|r| r.url.ends_with("flowread.json?auth=token-2")));
}

#[test]
fn one_denied_path_does_not_block_the_other_writes() {
    let mut http = FakeFirebase::new();
    http.denied_paths.push("/test/string".into());
    let (mut svc, mut db, mut sink) = setup(http);

    let report = svc.publish(0, &mut db, &mut sink).expect("ready");
    let results: Vec<_> = report.writes.iter().map(|w| w.result.clone()).collect();
    assert_eq!(results, vec![Err(DbError::Unauthorized), Ok(()), Ok(()), Ok(())]);

    let urls: Vec<_> = db.http().puts().iter().map(|r| r.url.clone()).collect();
    assert_eq!(urls.len(), 4);
    assert!(urls.iter().all(|u| u.ends_with("?auth=token-1")));

    // The 401 still triggers a fresh sign-in on the next cycle.
    let report = svc.publish(10_000, &mut db, &mut sink).expect("ready");
    assert_eq!(db.http().sign_ins(), 2);
    assert_eq!(report.failures().count(), 1);
    assert_eq!(db.http().puts().len(), 8);
}

#[test]
fn token_is_refreshed_inside_the_margin() {
    let mut http = FakeFirebase::new();
    // Expires at 600 s; the 300 s margin opens at 300 s.
    http.expires_in_secs = 600;
    let (mut svc, mut db, mut sink) = setup(http);

    svc.publish(0, &mut db, &mut sink);
    svc.publish(299_000, &mut db, &mut sink);
    assert_eq!(db.http().refreshes(), 0);

    svc.publish(300_000, &mut db, &mut sink);
    assert_eq!(db.http().refreshes(), 1);
    assert_eq!(db.http().sign_ins(), 1);

    let refresh = db
        .http()
        .requests
        .iter()
        .find(|r| r.url.contains("securetoken"))
        .cloned()
        .expect("refresh request");
    assert!(refresh.body.contains(r#""grant_type":"refresh_token""#));
    assert!(refresh.body.contains(r#""refresh_token":"refresh-token-1""#));
    assert!(db
        .http()
        .puts()
        .last()
        .is_some_and(|r| r.url.ends_with("?auth=token-2")));

    assert_eq!(
        sink.token_statuses(),
        vec![
            TokenStatus::Signing,
            TokenStatus::Requesting,
            TokenStatus::Ready,
            TokenStatus::Refreshing,
            TokenStatus::Ready,
        ]
    );
}

#[test]
fn unreachable_server_skips_publish_and_recovers() {
    let mut http = FakeFirebase::new();
    http.reachable = false;
    let (mut svc, mut db, mut sink) = setup(http);

    assert!(svc.publish(0, &mut db, &mut sink).is_none());
    assert!(db.http().puts().is_empty());
    assert_eq!(svc.next_sequence(), 0);
    assert_eq!(
        sink.token_statuses(),
        vec![TokenStatus::Signing, TokenStatus::Requesting, TokenStatus::Error]
    );
    assert_eq!(sink.events.last(), Some(&AppEvent::PublishSkipped));

    db.http_mut().reachable = true;
    let report = svc.publish(10_000, &mut db, &mut sink).expect("ready after recovery");
    assert_eq!(report.sequence, 0);
    assert_eq!(db.http().puts().len(), 4);
}

#[test]
fn rejected_credentials_never_write() {
    let mut http = FakeFirebase::new();
    http.sign_in_status = 400;
    let (mut svc, mut db, mut sink) = setup(http);

    for now in [0, 10_000, 20_000] {
        assert!(svc.publish(now, &mut db, &mut sink).is_none());
    }
    assert_eq!(db.http().sign_ins(), 3);
    assert!(db.http().puts().is_empty());
    assert_eq!(sink.count(|e| *e == AppEvent::PublishSkipped), 3);
}

#[test]
fn server_errors_on_writes_keep_the_token() {
    let mut http = FakeFirebase::new();
    http.write_status = 503;
    let (mut svc, mut db, mut sink) = setup(http);

    let report = svc.publish(0, &mut db, &mut sink).expect("ready");
    assert_eq!(report.failures().count(), 4);
    assert!(report.failures().all(|w| w.result == Err(DbError::Status(503))));
    assert_eq!(db.token_status(), TokenStatus::Ready);

    svc.publish(10_000, &mut db, &mut sink);
    assert_eq!(db.http().sign_ins(), 1);
    assert_eq!(svc.next_sequence(), 2);
}
