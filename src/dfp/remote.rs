//! Blocking HTTP/JSON client for an ad-server gateway.
//!
//! Each logical operation is one `POST {base_url}/{operation}` with a JSON
//! body; responses wrap their payload in `{"results": [...]}`. The gateway owns
//! the vendor protocol (SOAP, auth, paging), so this client stays a thin,
//! typed transport.

use reqwest::blocking::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

use crate::dfp::{AdServer, ops};
use crate::domain::{
    Advertiser, CreativeConfig, LineItemConfig, LineItemCreativeAssociation, Order, TargetingValue,
};
use crate::error::{AppError, ErrorKind};

pub const BASE_URL_ENV: &str = "ADSERVER_BASE_URL";
pub const API_TOKEN_ENV: &str = "ADSERVER_API_TOKEN";

pub struct RemoteAdServer {
    client: Client,
    base_url: String,
    api_token: String,
}

#[derive(Debug, Deserialize)]
struct Results<T> {
    #[serde(default = "Vec::new")]
    results: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct IdOnly {
    id: i64,
}

#[derive(Debug, Deserialize)]
struct NamedEntity {
    id: i64,
    name: String,
}

#[derive(Debug, Serialize)]
struct TargetingValueRequest<'a> {
    name: &'a str,
    display_name: &'a str,
    key_id: i64,
    match_type: &'static str,
}

impl RemoteAdServer {
    /// Build a client from `ADSERVER_BASE_URL` / `ADSERVER_API_TOKEN`, reading `.env` if present.
    pub fn from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();
        let base_url = std::env::var(BASE_URL_ENV)
            .map_err(|_| AppError::config(format!("Missing {BASE_URL_ENV} in environment (.env).")))?;
        let api_token = std::env::var(API_TOKEN_ENV)
            .map_err(|_| AppError::config(format!("Missing {API_TOKEN_ENV} in environment (.env).")))?;
        Ok(Self::new(base_url, api_token))
    }

    pub fn new(base_url: impl Into<String>, api_token: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_token: api_token.into(),
        }
    }

    fn call<Req, Resp>(&self, operation: &str, body: &Req) -> Result<Vec<Resp>, AppError>
    where
        Req: Serialize + ?Sized,
        Resp: DeserializeOwned,
    {
        let url = format!("{}/{operation}", self.base_url);
        debug!(%url, "ad server request");

        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.api_token)
            .json(body)
            .send()
            .map_err(|e| AppError::remote(format!("Ad server request {operation} failed: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            let detail = resp.text().unwrap_or_default();
            return Err(AppError::new(
                ErrorKind::RemoteService,
                format!("Ad server request {operation} failed with status {status}: {}", detail.trim()),
            ));
        }

        let body: Results<Resp> = resp
            .json()
            .map_err(|e| AppError::remote(format!("Failed to parse ad server response for {operation}: {e}")))?;

        Ok(body.results)
    }

    fn find_first_id(&self, operation: &str, body: serde_json::Value) -> Result<Option<i64>, AppError> {
        let found: Vec<IdOnly> = self.call(operation, &body)?;
        Ok(found.first().map(|e| e.id))
    }

    fn create_many<T: Serialize>(&self, operation: &str, items: &[T]) -> Result<Vec<i64>, AppError> {
        if items.is_empty() {
            return Ok(Vec::new());
        }
        let created: Vec<IdOnly> = self.call(operation, items)?;
        if created.len() != items.len() {
            return Err(AppError::remote(format!(
                "Ad server returned {} ids for {} objects in {operation}.",
                created.len(),
                items.len()
            )));
        }
        Ok(created.into_iter().map(|e| e.id).collect())
    }

    fn create_one<T: Serialize>(&self, operation: &str, item: &T) -> Result<i64, AppError> {
        self.create_many(operation, std::slice::from_ref(item))?
            .first()
            .copied()
            .ok_or_else(|| AppError::remote(format!("Ad server returned no id for {operation}.")))
    }
}

impl AdServer for RemoteAdServer {
    fn find_user_id_by_email(&mut self, email: &str) -> Result<Option<i64>, AppError> {
        self.find_first_id(ops::FIND_USER, json!({ "email": email }))
    }

    fn find_placement_id_by_name(&mut self, name: &str) -> Result<Option<i64>, AppError> {
        self.find_first_id(ops::FIND_PLACEMENT, json!({ "name": name }))
    }

    fn find_ad_unit_id_by_name(&mut self, name: &str) -> Result<Option<i64>, AppError> {
        self.find_first_id(ops::FIND_AD_UNIT, json!({ "name": name }))
    }

    fn find_advertisers_by_name(&mut self, name: &str) -> Result<Vec<Advertiser>, AppError> {
        let found: Vec<NamedEntity> = self.call(ops::FIND_ADVERTISERS, &json!({ "name": name }))?;
        Ok(found
            .into_iter()
            .map(|e| Advertiser { id: e.id, name: e.name })
            .collect())
    }

    fn create_advertiser(&mut self, name: &str) -> Result<Advertiser, AppError> {
        let id = self.create_one(ops::CREATE_ADVERTISER, &json!({ "name": name, "type": "AD_NETWORK" }))?;
        Ok(Advertiser {
            id,
            name: name.to_string(),
        })
    }

    fn find_orders_by_name(&mut self, name: &str) -> Result<Vec<Order>, AppError> {
        self.call(ops::FIND_ORDERS, &json!({ "name": name }))
    }

    fn create_order(&mut self, name: &str, advertiser_id: i64, trafficker_id: i64) -> Result<Order, AppError> {
        let id = self.create_one(
            ops::CREATE_ORDER,
            &json!({ "name": name, "advertiser_id": advertiser_id, "trafficker_id": trafficker_id }),
        )?;
        Ok(Order {
            id,
            name: name.to_string(),
            advertiser_id,
            trafficker_id,
            status: None,
        })
    }

    fn create_creatives(&mut self, creatives: &[CreativeConfig]) -> Result<Vec<i64>, AppError> {
        self.create_many(ops::CREATE_CREATIVES, creatives)
    }

    fn find_targeting_key_id_by_name(&mut self, name: &str) -> Result<Option<i64>, AppError> {
        self.find_first_id(ops::FIND_TARGETING_KEY, json!({ "name": name }))
    }

    fn create_targeting_key(&mut self, name: &str) -> Result<i64, AppError> {
        self.create_one(
            ops::CREATE_TARGETING_KEY,
            &json!({ "name": name, "display_name": name, "type": "FREEFORM" }),
        )
    }

    fn find_targeting_values_by_key_name(&mut self, key_name: &str) -> Result<Vec<TargetingValue>, AppError> {
        self.call(ops::FIND_TARGETING_VALUES, &json!({ "key_name": key_name }))
    }

    fn create_targeting_value(&mut self, name: &str, key_id: i64) -> Result<i64, AppError> {
        self.create_one(
            ops::CREATE_TARGETING_VALUE,
            &TargetingValueRequest {
                name,
                display_name: name,
                key_id,
                match_type: "EXACT",
            },
        )
    }

    fn create_line_items(&mut self, line_items: &[LineItemConfig]) -> Result<Vec<i64>, AppError> {
        self.create_many(ops::CREATE_LINE_ITEMS, line_items)
    }

    fn create_line_item_creative_associations(
        &mut self,
        associations: &[LineItemCreativeAssociation],
    ) -> Result<usize, AppError> {
        if associations.is_empty() {
            return Ok(0);
        }
        let created: Vec<serde_json::Value> = self.call(ops::CREATE_ASSOCIATIONS, associations)?;
        Ok(created.len())
    }
}
