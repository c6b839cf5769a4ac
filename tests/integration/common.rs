//! Common test utilities.

use std::io;
use std::sync::{Arc, Mutex};

use athena_glance::athena::{MockQueryService, ResultLocation};
use athena_glance::query::{PollPolicy, QueryExecutionClient};
use tracing::subscriber::DefaultGuard;
use tracing_subscriber::fmt::MakeWriter;

/// Log output captured by a scoped subscriber.
#[derive(Clone, Default)]
pub struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).to_string()
    }
}

pub struct CapturedWriter(Arc<Mutex<Vec<u8>>>);

impl io::Write for CapturedWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for CapturedLogs {
    type Writer = CapturedWriter;

    fn make_writer(&'a self) -> Self::Writer {
        CapturedWriter(self.0.clone())
    }
}

/// Installs a capturing subscriber for the current thread until the guard drops.
pub fn capture_logs() -> (CapturedLogs, DefaultGuard) {
    let logs = CapturedLogs::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(logs.clone())
        .with_ansi(false)
        .with_max_level(tracing::Level::DEBUG)
        .finish();
    let guard = tracing::subscriber::set_default(subscriber);
    (logs, guard)
}

/// A mock-backed client with a zero poll interval.
pub fn mock_client(
    mock: MockQueryService,
    max_attempts: u32,
) -> QueryExecutionClient<Arc<MockQueryService>> {
    QueryExecutionClient::new(
        Arc::new(mock),
        "detection_db",
        ResultLocation::new("me-interview", "results"),
    )
    .with_poll_policy(PollPolicy::new(max_attempts, std::time::Duration::ZERO).unwrap())
}
