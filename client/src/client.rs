use std::time::Duration;

use async_trait::async_trait;
use contact_navigator::PatientApi;
use contact_protocol::ApiErrorBody;
use contact_protocol::COUNT_PATH;
use contact_protocol::Patient;
use contact_protocol::PatientPatch;
use contact_protocol::PatientStats;
use contact_protocol::UpdatePatient;
use reqwest::Client;
use reqwest::Response;
use reqwest::StatusCode;
use reqwest::Url;
use serde::de::DeserializeOwned;

use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::error::Result;

/// Thin wrapper over the patient REST surface.
#[derive(Debug, Clone)]
pub struct PatientClient {
    client: Client,
    base_url: Url,
}

impl PatientClient {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        let invalid = || ClientError::InvalidBaseUrl(config.base_url.clone());
        let base_url = Url::parse(config.base_url.trim_end_matches('/')).map_err(|_| invalid())?;
        if base_url.cannot_be_a_base() {
            return Err(invalid());
        }

        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    /// Base URL with `segments` appended, each percent-encoded as one path
    /// segment.
    fn url<'a>(&self, segments: impl IntoIterator<Item = &'a str>) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    /// `Ok(None)` on 404.
    pub async fn fetch_patient(&self, patient_id: &str) -> Result<Option<Patient>> {
        let response = self.client.get(self.url([patient_id])).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            tracing::debug!(%patient_id, "Patient not found");
            return Ok(None);
        }
        decode(response).await.map(Some)
    }

    pub async fn fetch_uncontacted_patients(&self) -> Result<Vec<Patient>> {
        self.fetch_patients(false).await
    }

    pub async fn fetch_contacted_patients(&self) -> Result<Vec<Patient>> {
        self.fetch_patients(true).await
    }

    async fn fetch_patients(&self, contacted: bool) -> Result<Vec<Patient>> {
        let response = self
            .client
            .get(self.base_url.clone())
            .query(&[("contacted", contacted)])
            .send()
            .await?;
        decode(response).await
    }

    pub async fn fetch_all_patients_count(&self) -> Result<u64> {
        self.fetch_count(None).await
    }

    pub async fn fetch_contacted_patients_count(&self) -> Result<u64> {
        self.fetch_count(Some(true)).await
    }

    pub async fn fetch_uncontacted_patients_count(&self) -> Result<u64> {
        self.fetch_count(Some(false)).await
    }

    async fn fetch_count(&self, contacted: Option<bool>) -> Result<u64> {
        let mut request = self.client.get(self.url(COUNT_PATH.split('/')));
        if let Some(contacted) = contacted {
            request = request.query(&[("contacted", contacted)]);
        }
        decode(request.send().await?).await
    }

    /// Total, contacted and remaining counts, fetched in parallel.
    pub async fn fetch_patient_stats(&self) -> Result<PatientStats> {
        let (total, contacted, remaining) = tokio::try_join!(
            self.fetch_all_patients_count(),
            self.fetch_contacted_patients_count(),
            self.fetch_uncontacted_patients_count(),
        )?;

        Ok(PatientStats {
            total_patients_count: total,
            contacted_patients_count: contacted,
            remaining_patients_count: remaining,
        })
    }

    /// PATCH `{contacted}` and return whatever fields the server echoed.
    pub async fn update_contacted_patient(
        &self,
        patient_id: &str,
        contacted: bool,
    ) -> Result<PatientPatch> {
        let response = self
            .client
            .patch(self.url([patient_id]))
            .json(&UpdatePatient::contacted(contacted))
            .send()
            .await?;
        decode(response).await
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ApiErrorBody>(&body)
            .map(|body| body.error.message)
            .unwrap_or(body);
        return Err(ClientError::Status {
            status: status.as_u16(),
            message,
        });
    }
    Ok(response.json().await?)
}

#[async_trait]
impl PatientApi for PatientClient {
    type Error = ClientError;

    async fn fetch_patient(&self, patient_id: &str) -> Result<Option<Patient>> {
        PatientClient::fetch_patient(self, patient_id).await
    }

    async fn fetch_uncontacted_patients(&self) -> Result<Vec<Patient>> {
        PatientClient::fetch_uncontacted_patients(self).await
    }

    async fn fetch_patient_stats(&self) -> Result<PatientStats> {
        PatientClient::fetch_patient_stats(self).await
    }

    async fn update_contacted_patient(
        &self,
        patient_id: &str,
        contacted: bool,
    ) -> Result<PatientPatch> {
        PatientClient::update_contacted_patient(self, patient_id, contacted).await
    }
}
