//! Browser session teardown tests
//!
//! The form driver promises to delete its WebDriver session on every exit
//! path. These tests run the real submitter against a fake chromedriver
//! wire endpoint and check that `DELETE /session/{id}` is issued after each
//! failure mode, not just after success.

use std::io::{BufRead, BufReader, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::{Arc, Mutex};
use std::thread;

use chrono::NaiveDate;
use rollcall_export::browser::{ReportSubmitter, WebDriverSubmitter};
use rollcall_export::canvas::LaunchUrl;
use rollcall_export::errors::SubmissionError;
use rollcall_export::report::compute_range;
use rollcall_export::settings::BrowserSettings;

const SESSION_ID: &str = "fake-session";

/// W3C web element identifier key
const ELEMENT_KEY: &str = "element-6066-11e4-a52e-4f735466cecf";

/// How the fake endpoint plays the Roll Call page
#[derive(Clone, Copy)]
enum PageScript {
    /// Element queries always come back empty: the form never renders
    FormNeverAppears,
    /// The start-date field renders, but the end-date lookup reports
    /// "no such element" mid-population
    EndDateFieldMissing,
    /// The end-date lookup fails with a server-side fault
    EndDateLookupFaults,
}

struct FakeChromedriver {
    url: String,
    requests: Arc<Mutex<Vec<String>>>,
}

impl FakeChromedriver {
    fn spawn(script: PageScript) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());
        let requests = Arc::new(Mutex::new(Vec::new()));
        let log = Arc::clone(&requests);
        thread::spawn(move || {
            for stream in listener.incoming() {
                let Ok(stream) = stream else { break };
                handle_connection(stream, script, &log);
            }
        });
        Self { url, requests }
    }

    /// Requests seen so far, as "METHOD path" lines in arrival order
    fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

fn handle_connection(mut stream: TcpStream, script: PageScript, log: &Arc<Mutex<Vec<String>>>) {
    let Ok(read_half) = stream.try_clone() else {
        return;
    };
    let mut reader = BufReader::new(read_half);

    let mut request_line = String::new();
    if reader.read_line(&mut request_line).is_err() || request_line.trim().is_empty() {
        return;
    }
    let mut parts = request_line.split_whitespace();
    let method = parts.next().unwrap_or_default().to_string();
    let path = parts.next().unwrap_or_default().to_string();

    let mut content_length = 0usize;
    loop {
        let mut line = String::new();
        if reader.read_line(&mut line).is_err() || line.trim().is_empty() {
            break;
        }
        if let Some((name, value)) = line.split_once(':') {
            if name.eq_ignore_ascii_case("content-length") {
                content_length = value.trim().parse().unwrap_or(0);
            }
        }
    }
    let mut body = vec![0u8; content_length];
    let _ = reader.read_exact(&mut body);

    log.lock().unwrap().push(format!("{method} {path}"));

    let (status, payload) = respond(&method, &path, script);
    let response = format!(
        "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{payload}",
        payload.len(),
    );
    let _ = stream.write_all(response.as_bytes());
}

fn respond(method: &str, path: &str, script: PageScript) -> (&'static str, String) {
    if method == "POST" && path == "/session" {
        return (
            "200 OK",
            format!(r#"{{"value":{{"sessionId":"{SESSION_ID}","capabilities":{{}}}}}}"#),
        );
    }
    // Element queries (polled while waiting for the form to appear)
    if method == "POST" && path.ends_with("/elements") {
        let listing = match script {
            PageScript::FormNeverAppears => String::from("[]"),
            _ => format!(r#"[{{"{ELEMENT_KEY}":"start-field"}}]"#),
        };
        return ("200 OK", format!(r#"{{"value":{listing}}}"#));
    }
    // Singular element lookup: the first one the driver makes after the
    // start-date field is the end-date field
    if method == "POST" && path.ends_with("/element") {
        return match script {
            PageScript::EndDateLookupFaults => (
                "500 Internal Server Error",
                String::from(
                    r#"{"value":{"error":"unknown error","message":"session went away","stacktrace":""}}"#,
                ),
            ),
            _ => (
                "404 Not Found",
                String::from(
                    r#"{"value":{"error":"no such element","message":"no such element","stacktrace":""}}"#,
                ),
            ),
        };
    }
    // Current-URL lookups (issued by `goto` to resolve the navigation
    // target) must carry a string, not null
    if method == "GET" && path.ends_with("/url") {
        return ("200 OK", String::from(r#"{"value":"about:blank"}"#));
    }
    // Everything else: timeouts, navigation, clear, send_keys, click,
    // session delete
    ("200 OK", String::from(r#"{"value":null}"#))
}

fn fast_settings(webdriver_url: &str) -> BrowserSettings {
    BrowserSettings {
        webdriver_url: webdriver_url.to_string(),
        page_load_timeout_secs: 5,
        element_wait_timeout_secs: 1,
        form_submit_wait_secs: 0,
    }
}

async fn run_submitter(server: &FakeChromedriver) -> Result<(), SubmissionError> {
    let submitter = WebDriverSubmitter::new(fast_settings(&server.url));
    let launch_url = LaunchUrl::new(
        "https://school.instructure.com/courses/1/external_tools/sessionless_launch?verifier=x"
            .to_string(),
    );
    // 2024-12-18 is a Wednesday
    let range = compute_range(NaiveDate::from_ymd_opt(2024, 12, 18).unwrap());
    let recipients = vec!["registrar@school.edu".to_string()];
    submitter
        .submit_report_request(&launch_url, &range, &recipients)
        .await
}

fn session_delete() -> String {
    format!("DELETE /session/{SESSION_ID}")
}

#[tokio::test]
async fn session_is_deleted_after_a_form_wait_timeout() {
    let server = FakeChromedriver::spawn(PageScript::FormNeverAppears);

    let err = run_submitter(&server).await.unwrap_err();
    assert!(
        matches!(err, SubmissionError::TimedOutAwaitingForm { .. }),
        "unexpected error: {err}"
    );

    let requests = server.requests();
    assert!(
        requests.contains(&session_delete()),
        "no session delete in {requests:?}"
    );
}

#[tokio::test]
async fn session_is_deleted_after_a_failure_mid_population() {
    let server = FakeChromedriver::spawn(PageScript::EndDateFieldMissing);

    let err = run_submitter(&server).await.unwrap_err();
    assert!(
        matches!(
            err,
            SubmissionError::FormLayoutChanged {
                field: "report[end_date]"
            }
        ),
        "unexpected error: {err}"
    );

    // Teardown is the last thing the submitter does before returning
    let requests = server.requests();
    assert_eq!(
        requests.last(),
        Some(&session_delete()),
        "session delete not last in {requests:?}"
    );
}

#[tokio::test]
async fn driver_fault_mid_population_still_tears_the_session_down() {
    let server = FakeChromedriver::spawn(PageScript::EndDateLookupFaults);

    let err = run_submitter(&server).await.unwrap_err();
    assert!(
        matches!(err, SubmissionError::Interaction(_)),
        "unexpected error: {err}"
    );

    let requests = server.requests();
    assert_eq!(
        requests.last(),
        Some(&session_delete()),
        "session delete not last in {requests:?}"
    );
}
