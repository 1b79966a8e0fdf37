use super::{ISmsGateway, SmsError, SmsReceipt};
use std::collections::VecDeque;
use std::sync::Mutex;

/// Scripted gateway for tests: pops a queued result per send and records
/// every call. When the script is empty every send succeeds.
pub struct FakeSmsGateway {
    script: Mutex<VecDeque<Result<SmsReceipt, SmsError>>>,
    calls: Mutex<Vec<(String, String)>>,
    ready: bool,
}

impl FakeSmsGateway {
    pub fn new() -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            calls: Mutex::new(Vec::new()),
            ready: true,
        }
    }

    pub fn not_ready() -> Self {
        Self {
            ready: false,
            ..Self::new()
        }
    }

    pub fn enqueue(&self, result: Result<SmsReceipt, SmsError>) {
        self.script.lock().unwrap().push_back(result);
    }

    pub fn enqueue_ok(&self, sid: &str) {
        self.enqueue(Ok(SmsReceipt {
            sid: sid.to_string(),
            status: "queued".to_string(),
        }));
    }

    /// Every `(to, body)` pair passed to `send`, in order.
    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }
}

impl Default for FakeSmsGateway {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl ISmsGateway for FakeSmsGateway {
    async fn send(&self, to: &str, body: &str) -> Result<SmsReceipt, SmsError> {
        self.calls
            .lock()
            .unwrap()
            .push((to.to_string(), body.to_string()));
        match self.script.lock().unwrap().pop_front() {
            Some(result) => result,
            None => Ok(SmsReceipt {
                sid: format!("SM{:08}", self.calls.lock().unwrap().len()),
                status: "queued".to_string(),
            }),
        }
    }

    fn is_ready(&self) -> bool {
        self.ready
    }
}
