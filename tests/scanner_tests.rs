use std::time::Duration;

use reconhub::scanner::{
    synthesize_results, DelayRange, ScanError, ScanEvent, ScanOutcome, Scanner,
};
use reconhub::types::ScanPhase;

#[tokio::test]
async fn scan_reveals_template_in_order() {
    let scanner = Scanner::new(DelayRange::none());
    let outcome = scanner.start("example.com").await.expect("start").wait().await;

    let ScanOutcome::Completed(item) = outcome else {
        panic!("scan did not complete");
    };
    assert_eq!(item.domain, "example.com");
    assert_eq!(item.subdomain_count, 10);

    let results = scanner.results().await;
    assert_eq!(results, synthesize_results("example.com"));
    let labels: Vec<&str> = results
        .iter()
        .map(|r| r.subdomain.strip_suffix(".example.com").unwrap())
        .collect();
    assert_eq!(
        labels,
        vec!["www", "api", "admin", "blog", "mail", "dev", "staging", "ftp", "cdn", "shop"]
    );

    let status = scanner.status().await;
    assert_eq!(status.state, ScanPhase::Complete);
    assert_eq!(status.progress, 100);
    assert!(status.complete);
    assert_eq!(status.notice.unwrap().description, "Found 10 subdomains for example.com");
}

#[tokio::test]
async fn progress_advances_ten_percent_per_record() {
    let scanner = Scanner::new(DelayRange::none());
    let mut rx = scanner.subscribe();
    let handle = scanner.start("example.com").await.unwrap();

    let mut seen = Vec::new();
    while let Ok(ev) = rx.recv().await {
        match ev {
            ScanEvent::Progress { progress, .. } => seen.push(progress),
            ScanEvent::Completed(_) => break,
            _ => {}
        }
    }
    assert_eq!(seen, vec![10, 20, 30, 40, 50, 60, 70, 80, 90, 100]);
    assert!(matches!(handle.wait().await, ScanOutcome::Completed(_)));
}

#[tokio::test]
async fn history_keeps_five_most_recent() {
    let scanner = Scanner::new(DelayRange::none());
    for n in 1..=6 {
        let outcome = scanner.start(&format!("d{n}.com")).await.unwrap().wait().await;
        assert!(matches!(outcome, ScanOutcome::Completed(_)));
    }
    let history = scanner.history().await;
    let domains: Vec<&str> = history.iter().map(|h| h.domain.as_str()).collect();
    assert_eq!(domains, vec!["d6.com", "d5.com", "d4.com", "d3.com", "d2.com"]);
    assert!(history.iter().all(|h| h.subdomain_count == 10));
}

#[tokio::test]
async fn new_scan_resets_before_first_record() {
    let scanner = Scanner::new(DelayRange::fixed(Duration::from_millis(100)));
    let mut rx = scanner.subscribe();
    let first = scanner.start("old.com").await.unwrap();

    loop {
        if let ScanEvent::Progress { .. } = rx.recv().await.unwrap() {
            break;
        }
    }
    assert_eq!(scanner.status().await.found, 1);

    let second = scanner.start("new.com").await.unwrap();
    let status = scanner.status().await;
    assert_eq!(status.found, 0);
    assert_eq!(status.progress, 0);
    assert_eq!(status.domain.as_deref(), Some("new.com"));
    assert_eq!(status.state, ScanPhase::Scanning);

    assert_eq!(first.wait().await, ScanOutcome::Cancelled);
    scanner.cancel().await;
    assert_eq!(second.wait().await, ScanOutcome::Cancelled);
}

#[tokio::test]
async fn superseded_scan_never_appends() {
    let scanner = Scanner::new(DelayRange::fixed(Duration::from_millis(5)));
    let a = scanner.start("a.com").await.unwrap();
    let b = scanner.start("b.com").await.unwrap();

    assert_eq!(a.wait().await, ScanOutcome::Cancelled);
    assert!(matches!(b.wait().await, ScanOutcome::Completed(_)));

    let results = scanner.results().await;
    assert_eq!(results.len(), 10);
    assert!(results.iter().all(|r| r.subdomain.ends_with(".b.com")));
    assert_eq!(scanner.history().await.len(), 1);
}

#[tokio::test]
async fn selecting_history_reruns_full_scan() {
    let scanner = Scanner::new(DelayRange::none());
    scanner.start("example.com").await.unwrap().wait().await;
    scanner.start("other.org").await.unwrap().wait().await;

    let outcome = scanner.select_history("example.com").await.unwrap().wait().await;
    assert!(matches!(outcome, ScanOutcome::Completed(_)));
    assert_eq!(scanner.results().await, synthesize_results("example.com"));
    assert_eq!(scanner.history().await[0].domain, "example.com");
}

#[tokio::test]
async fn blank_domain_is_rejected() {
    let scanner = Scanner::new(DelayRange::none());
    assert_eq!(scanner.start("   ").await.unwrap_err(), ScanError::EmptyDomain);
    assert_eq!(scanner.status().await.state, ScanPhase::Idle);
}

#[tokio::test]
async fn cancel_stops_the_run() {
    let scanner = Scanner::new(DelayRange::fixed(Duration::from_millis(50)));
    let handle = scanner.start("example.com").await.unwrap();
    assert!(scanner.cancel().await);
    assert_eq!(handle.wait().await, ScanOutcome::Cancelled);

    let status = scanner.status().await;
    assert_eq!(status.state, ScanPhase::Idle);
    assert!(scanner.history().await.is_empty());
    assert!(!scanner.cancel().await);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_dashboard_requests_start_once() {
    let scanner = Scanner::new(DelayRange::fixed(Duration::from_millis(50)));
    let mut tasks = Vec::new();
    for _ in 0..8 {
        let scanner = scanner.clone();
        tasks.push(tokio::spawn(async move {
            scanner.start_unless_running("example.com").await.unwrap().is_some()
        }));
    }
    let mut started = 0;
    for t in tasks {
        if t.await.unwrap() {
            started += 1;
        }
    }
    assert_eq!(started, 1);
    scanner.cancel().await;
}

#[tokio::test]
async fn same_domain_is_not_restarted_while_running() {
    let scanner = Scanner::new(DelayRange::fixed(Duration::from_millis(50)));
    let handle = scanner.start("example.com").await.unwrap();
    assert!(scanner.start_unless_running("example.com").await.unwrap().is_none());
    let other = scanner.start_unless_running("other.com").await.unwrap();
    assert!(other.is_some());
    assert_eq!(handle.wait().await, ScanOutcome::Cancelled);
    scanner.cancel().await;
}
