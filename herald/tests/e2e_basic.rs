use std::sync::Arc;

use herald::{
    channel::{ProcessChannel, ProcessChannelConfig},
    notifier::LogNotifier,
};
use herald_dataset::{Dataset, Export, Ledger};
use herald_dispatch::{
    DeliveryChannel, DeliveryMode, Dispatcher, Notifier, RunConfig, RunMode, SessionTimeouts,
};

#[tokio::test]
async fn run_annotates_and_exports_the_dataset() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("recipients.csv");
    std::fs::write(&input, "name,phone\nAda,111\nGrace,222\n").unwrap();

    let dataset = Dataset::from_path(&input).unwrap();
    let ledger = Arc::new(Ledger::new(dataset));

    let channel: Arc<dyn DeliveryChannel> = Arc::new(ProcessChannel::new(ProcessChannelConfig {
        command: "cat".to_string(),
        args: vec![],
    }));
    let notifier: Arc<dyn Notifier> = Arc::new(LogNotifier);

    let dispatcher = Dispatcher::new(
        Arc::clone(&ledger),
        channel,
        notifier,
        DeliveryMode::Automated,
        SessionTimeouts {
            settle_ms: 5,
            overall_ms: 2000,
            reminder_ms: 60_000,
            poll_ms: 50,
        },
    );

    dispatcher
        .start(RunConfig {
            message: "hello".to_string(),
            min_delay_ms: 1,
            max_delay_ms: 5,
            send_limit: None,
        })
        .unwrap();
    assert_eq!(dispatcher.settled().await, RunMode::Completed);

    let out = dir.path().join(Export::file_name("csv"));
    std::fs::write(&out, ledger.export().to_csv().unwrap()).unwrap();

    let written = std::fs::read_to_string(&out).unwrap();
    assert_eq!(written, "name,phone,Status\nAda,111,Sent\nGrace,222,Sent\n");

    let name = out.file_name().unwrap().to_string_lossy().into_owned();
    assert!(name.starts_with("updated_"));
    assert!(name.ends_with(".csv"));
}
