use crate::domain::health::ProcessorHealth;
use crate::domain::payment::RoutableRequest;
use crate::domain::processor::ProcessorName;
use crate::processors::{CallOutcome, ProcessorClient, ProcessorReply};
use std::time::Duration;

pub struct HttpProcessorClient {
    pub name: ProcessorName,
    pub base_url: String,
    pub client: reqwest::Client,
}

impl HttpProcessorClient {
    pub fn new(name: ProcessorName, base_url: String, client: reqwest::Client) -> Self {
        Self {
            name,
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        }
    }
}

#[async_trait::async_trait]
impl ProcessorClient for HttpProcessorClient {
    fn name(&self) -> ProcessorName {
        self.name
    }

    async fn process_payment(
        &self,
        request: &RoutableRequest,
        timeout: Duration,
    ) -> CallOutcome {
        let resp = self
            .client
            .post(format!("{}/payments", self.base_url))
            .json(request)
            .timeout(timeout)
            .send()
            .await;

        match resp {
            Ok(r) if r.status().is_success() => CallOutcome::Accepted,
            Ok(r) => {
                let status = r.status().as_u16();
                let reply: ProcessorReply = r.json().await.unwrap_or_default();
                CallOutcome::Rejected {
                    status,
                    message: reply.message.unwrap_or_default(),
                }
            }
            Err(e) => CallOutcome::Unreachable {
                reason: e.to_string(),
            },
        }
    }

    async fn probe_health(&self, timeout: Duration) -> ProcessorHealth {
        let resp = self
            .client
            .get(format!("{}/payments/service-health", self.base_url))
            .timeout(timeout)
            .send()
            .await;

        match resp {
            Ok(r) if r.status().as_u16() == 200 => {
                r.json().await.unwrap_or(ProcessorHealth::UNHEALTHY)
            }
            _ => ProcessorHealth::UNHEALTHY,
        }
    }
}
