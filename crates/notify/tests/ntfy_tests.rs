use async_trait::async_trait;
use courier_core::notify::entity::Attachment;
use courier_core::notify::error::NotifyError;
use courier_core::notify::port::Service;
use courier_core::notify::send::{apply_send_options, send_with_attachments, send_with_dry_run};
use courier_notify::ntfy::{
    self, NtfyClient, NtfyService, ParseMode, Priority, Publish, SendConfig,
};
use courier_notify::slack;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;

/// 记录发布内容与上传文件名的 ntfy 客户端。
#[derive(Clone, Default)]
struct FakeNtfy {
    published: Arc<Mutex<Vec<Publish>>>,
    uploads: Arc<Mutex<Vec<(String, String)>>>,
    failing_topic: Option<String>,
}

impl FakeNtfy {
    fn published(&self) -> Vec<Publish> {
        self.published.lock().unwrap().clone()
    }

    fn uploads(&self) -> Vec<(String, String)> {
        self.uploads.lock().unwrap().clone()
    }
}

#[async_trait]
impl NtfyClient for FakeNtfy {
    async fn publish(&self, message: &Publish) -> Result<(), NotifyError> {
        self.published.lock().unwrap().push(message.clone());
        if self.failing_topic.as_deref() == Some(message.topic.as_str()) {
            return Err(NotifyError::Network("connection reset".into()));
        }
        Ok(())
    }

    async fn upload(&self, topic: &str, attachment: &Attachment) -> Result<(), NotifyError> {
        self.uploads
            .lock()
            .unwrap()
            .push((topic.to_string(), attachment.name.clone()));
        Ok(())
    }
}

fn service_with(fake: &FakeNtfy, mut opts: Vec<ntfy::NtfyOption>) -> NtfyService {
    opts.insert(0, ntfy::with_client(fake.clone()));
    NtfyService::new(opts).unwrap()
}

#[test]
fn test_new_defaults() {
    let service = NtfyService::new(vec![]).unwrap();
    assert_eq!(service.name(), "ntfy");
    assert_eq!(service.server_url(), "https://ntfy.sh");
    assert!(service.recipients().is_empty());
    assert!(!service.is_dry_run());
}

#[test]
fn test_new_rejects_bad_server_url() {
    for url in ["not a url", "ftp://ntfy.example.com"] {
        match NtfyService::new(vec![ntfy::with_server_url(url)]) {
            Err(NotifyError::Config(_)) => {}
            Err(other) => panic!("unexpected error for {url}: {other}"),
            Ok(_) => panic!("{url} should be rejected"),
        }
    }
}

#[test]
fn test_send_options_last_write_wins() {
    let mut conf = SendConfig::default();
    apply_send_options(
        &mut conf,
        &[
            ntfy::send_with_priority(Priority::Low),
            ntfy::send_with_tags(["a", "b"]),
            ntfy::send_with_delay("1h"),
            ntfy::send_with_priority(Priority::High),
            ntfy::send_with_tags(["c"]),
            ntfy::send_with_delay("30m"),
            ntfy::send_with_parse_mode(ParseMode::Markdown),
            ntfy::send_with_click_action("https://a.example"),
            ntfy::send_with_click_action("https://b.example"),
        ],
    );

    assert_eq!(conf.priority, Priority::High);
    assert_eq!(conf.tags, vec!["c"]);
    assert_eq!(conf.delay, "30m");
    assert_eq!(conf.parse_mode, ParseMode::Markdown);
    assert_eq!(conf.click_action, "https://b.example");
}

#[test]
fn test_slack_option_leaves_ntfy_config_untouched() {
    let original = SendConfig {
        message: "m".into(),
        priority: Priority::Min,
        ..SendConfig::default()
    };
    let mut conf = original.clone();
    apply_send_options(&mut conf, &[slack::send_with_escape_message(true)]);
    assert_eq!(conf, original);
}

#[tokio::test]
async fn test_send_publishes_each_topic() {
    let fake = FakeNtfy::default();
    let service = service_with(&fake, vec![]);
    service.add_recipients(["alerts", "ops"]);

    service.send("Backup", "finished", &[]).await.unwrap();

    let published = fake.published();
    assert_eq!(published.len(), 2);
    assert_eq!(published[0].topic, "alerts");
    assert_eq!(published[1].topic, "ops");
    assert_eq!(published[0].title, "Backup");
    assert_eq!(published[0].message, "finished");
    assert_eq!(published[0].priority, 3);
    assert!(!published[0].markdown);
}

#[tokio::test]
async fn test_service_defaults_then_send_options() {
    let fake = FakeNtfy::default();
    let service = service_with(
        &fake,
        vec![
            ntfy::with_priority(Priority::High),
            ntfy::with_tags(["server"]),
            ntfy::with_parse_mode(ParseMode::Markdown),
            ntfy::with_click_action("https://status.example.com"),
        ],
    );
    service.add_recipients(["alerts"]);

    service
        .send(
            "s",
            "m",
            &[ntfy::send_with_tags(["warning"]), ntfy::send_with_delay("5m")],
        )
        .await
        .unwrap();

    let published = fake.published();
    assert_eq!(published[0].priority, 4);
    assert_eq!(published[0].tags, vec!["warning"]);
    assert_eq!(published[0].delay, "5m");
    assert_eq!(published[0].click, "https://status.example.com");
    assert!(published[0].markdown);
}

#[tokio::test]
async fn test_dry_run_publishes_nothing() {
    let fake = FakeNtfy::default();
    let service = service_with(&fake, vec![]);
    service.add_recipients(["alerts"]);

    service
        .send(
            "s",
            "m",
            &[
                send_with_attachments(vec![Attachment::new("x.txt", b"x".to_vec())]),
                send_with_dry_run(true),
            ],
        )
        .await
        .unwrap();

    assert!(fake.published().is_empty());
    assert!(fake.uploads().is_empty());
}

#[tokio::test]
async fn test_attachments_uploaded_per_topic() {
    let fake = FakeNtfy::default();
    let service = service_with(&fake, vec![]);
    service.add_recipients(["a", "b"]);

    service
        .send(
            "s",
            "m",
            &[send_with_attachments(vec![Attachment::new("dump.txt", b"...".to_vec())])],
        )
        .await
        .unwrap();

    assert_eq!(
        fake.uploads(),
        vec![
            ("a".to_string(), "dump.txt".to_string()),
            ("b".to_string(), "dump.txt".to_string())
        ]
    );
}

#[tokio::test]
async fn test_failed_topic_is_reported_and_others_continue() {
    let fake = FakeNtfy {
        failing_topic: Some("b".into()),
        ..FakeNtfy::default()
    };
    let service = service_with(&fake, vec![ntfy::with_name("home-ntfy")]);
    service.add_recipients(["a", "b", "c"]);

    let err = service.send("s", "m", &[]).await.unwrap_err();

    assert_eq!(service.name(), "home-ntfy");
    assert_eq!(err.failures().len(), 1);
    assert_eq!(err.failures()[0].target, "b");
    assert_eq!(fake.published().len(), 3);
}

#[tokio::test]
async fn test_custom_renderer() {
    let fake = FakeNtfy::default();
    let service = service_with(
        &fake,
        vec![ntfy::with_message_renderer(|conf: &SendConfig| {
            format!("{}: {}", conf.subject, conf.message)
        })],
    );
    service.add_recipients(["alerts"]);

    service.send("CPU", "95%", &[]).await.unwrap();

    assert_eq!(fake.published()[0].message, "CPU: 95%");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_add_recipients_loses_nothing() {
    let service = Arc::new(NtfyService::new(vec![]).unwrap());
    let mut handles = Vec::new();
    for i in 0..64 {
        let service = service.clone();
        handles.push(tokio::spawn(async move {
            service.add_recipients([format!("topic-{i}")]);
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }
    let mut recipients = service.recipients();
    recipients.sort();
    recipients.dedup();
    assert_eq!(recipients.len(), 64);
}

/// 在 publish 中挂起，直到测试放行。
#[derive(Clone, Default)]
struct BlockingNtfy {
    entered: Arc<Notify>,
    release: Arc<Notify>,
    published: Arc<Mutex<Vec<String>>>,
}

#[async_trait]
impl NtfyClient for BlockingNtfy {
    async fn publish(&self, message: &Publish) -> Result<(), NotifyError> {
        self.entered.notify_one();
        self.release.notified().await;
        self.published.lock().unwrap().push(message.topic.clone());
        Ok(())
    }

    async fn upload(&self, _: &str, _: &Attachment) -> Result<(), NotifyError> {
        Ok(())
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_add_recipients_not_blocked_by_in_flight_send() {
    let fake = BlockingNtfy::default();
    let service = Arc::new(NtfyService::new(vec![ntfy::with_client(fake.clone())]).unwrap());
    service.add_recipients(["alerts"]);

    let sending = {
        let service = service.clone();
        tokio::spawn(async move { service.send("s", "m", &[]).await })
    };
    fake.entered.notified().await;

    let adder = service.clone();
    let added = tokio::time::timeout(
        Duration::from_secs(2),
        tokio::task::spawn_blocking(move || adder.add_recipients(["ops"])),
    )
    .await;
    assert!(added.is_ok(), "add_recipients stalled behind send");
    assert_eq!(service.recipients(), vec!["alerts", "ops"]);

    fake.release.notify_one();
    sending.await.unwrap().unwrap();
    assert_eq!(*fake.published.lock().unwrap(), vec!["alerts".to_string()]);
}
