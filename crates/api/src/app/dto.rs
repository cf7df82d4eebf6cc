//! Request bodies, the JSON extractor and the success envelope.

use core::str::FromStr;

use axum::{
    extract::{FromRequest, Request},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize, de::DeserializeOwned};

use laundry_core::DomainError;
use laundry_inventory::{Category, ItemUpdate, Unit};
use laundry_leave::{LeaveDecision, LeaveType};
use laundry_reorder::{ReorderDecision, ReorderLine};

use crate::app::errors::json_error;

// -------------------------
// Envelope + extractors
// -------------------------

#[derive(Debug, Serialize)]
struct Envelope<T> {
    success: bool,
    data: T,
}

pub fn ok<T: Serialize>(data: T) -> Response {
    respond(StatusCode::OK, data)
}

pub fn created<T: Serialize>(data: T) -> Response {
    respond(StatusCode::CREATED, data)
}

fn respond<T: Serialize>(status: StatusCode, data: T) -> Response {
    (status, axum::Json(Envelope { success: true, data })).into_response()
}

/// `axum::Json`, but rejections come back in the error envelope as 400.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApiJson<T>(pub T);

#[axum::async_trait]
impl<T, S> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match axum::Json::<T>::from_request(req, state).await {
            Ok(axum::Json(value)) => Ok(ApiJson(value)),
            Err(rejection) => Err(json_error(
                StatusCode::BAD_REQUEST,
                "validation_error",
                rejection.body_text(),
            )),
        }
    }
}

/// Parse a typed id (or enum) from a path segment or body field.
pub fn parse<T>(raw: &str) -> Result<T, Response>
where
    T: FromStr<Err = DomainError>,
{
    raw.parse()
        .map_err(|e: DomainError| json_error(StatusCode::BAD_REQUEST, "validation_error", e.to_string()))
}

fn parse_opt<T>(raw: Option<&str>) -> Result<Option<T>, Response>
where
    T: FromStr<Err = DomainError>,
{
    raw.map(parse).transpose()
}

// -------------------------
// Inventory
// -------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateItemRequest {
    pub name: String,
    pub category: String,
    pub current_stock: i64,
    pub reorder_level: i64,
    pub unit: String,
    #[serde(default)]
    pub supplier: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateItemRequest {
    pub name: Option<String>,
    pub category: Option<String>,
    pub current_stock: Option<i64>,
    pub reorder_level: Option<i64>,
    pub unit: Option<String>,
    pub supplier: Option<String>,
}

impl UpdateItemRequest {
    pub fn into_update(self) -> Result<ItemUpdate, Response> {
        Ok(ItemUpdate {
            name: self.name,
            category: parse_opt::<Category>(self.category.as_deref())?,
            current_stock: self.current_stock,
            reorder_level: self.reorder_level,
            unit: parse_opt::<Unit>(self.unit.as_deref())?,
            supplier: parse_opt(self.supplier.as_deref())?,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct AdjustStockRequest {
    pub delta: i64,
}

// -------------------------
// Employee requests
// -------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestLineBody {
    pub inventory_item: String,
    pub quantity: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateEmployeeRequestBody {
    pub order_id: String,
    pub items: Vec<RequestLineBody>,
}

#[derive(Debug, Default, Deserialize)]
pub struct DecisionNotes {
    #[serde(default)]
    pub notes: Option<String>,
}

// -------------------------
// Reorders
// -------------------------

#[derive(Debug, Deserialize)]
pub struct ReorderLineBody {
    pub name: String,
    pub category: String,
    pub quantity: i64,
    pub unit: String,
}

impl ReorderLineBody {
    pub fn into_line(self) -> Result<ReorderLine, Response> {
        Ok(ReorderLine {
            name: self.name,
            category: parse(&self.category)?,
            quantity: self.quantity,
            unit: parse(&self.unit)?,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateReorderRequest {
    pub supplier_id: String,
    pub items: Vec<ReorderLineBody>,
    #[serde(default)]
    pub expected_delivery_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ReorderStatusRequest {
    pub status: ReorderDecision,
}

// -------------------------
// Orders
// -------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceOrderRequest {
    pub customer_id: String,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub is_paid: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignOrderRequest {
    pub employee_id: String,
}

// -------------------------
// Leave
// -------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplyLeaveRequest {
    pub leave_type: LeaveType,
    pub start_date: String,
    pub end_date: String,
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LeaveStatusRequest {
    pub status: LeaveDecision,
}

/// RFC 3339 timestamp, or a bare `YYYY-MM-DD` date read as midnight UTC.
pub fn parse_instant(field: &str, raw: &str) -> Result<DateTime<Utc>, Response> {
    let raw = raw.trim();
    if let Ok(at) = DateTime::parse_from_rfc3339(raw) {
        return Ok(at.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|at| at.and_utc())
        .ok_or_else(|| {
            json_error(
                StatusCode::BAD_REQUEST,
                "validation_error",
                format!("{field} is not a valid date: {raw}"),
            )
        })
}

#[cfg(test)]
mod tests {
    use laundry_inventory::InventoryItemId;

    use super::*;

    #[test]
    fn update_request_parses_category_and_unit_leniently() {
        let body: UpdateItemRequest =
            serde_json::from_str(r#"{"category":"personal care","unit":"KG"}"#).unwrap();
        let update = body.into_update().unwrap();

        assert_eq!(update.category, Some(Category::PersonalCare));
        assert_eq!(update.unit, Some(Unit::Kg));
        assert_eq!(update.name, None);
    }

    #[test]
    fn unknown_unit_is_a_400() {
        let line = ReorderLineBody {
            name: "Bleach".into(),
            category: "Cleaning".into(),
            quantity: 5,
            unit: "gallons".into(),
        };
        let res = line.into_line().unwrap_err();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn ids_parse_from_path_segments() {
        let id = InventoryItemId::new();
        assert_eq!(parse::<InventoryItemId>(&id.to_string()).unwrap(), id);
        assert_eq!(
            parse::<InventoryItemId>("nope").unwrap_err().status(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn leave_dates_accept_timestamps_and_bare_dates() {
        let day = parse_instant("startDate", "2026-03-02").unwrap();
        assert_eq!(day.to_rfc3339(), "2026-03-02T00:00:00+00:00");

        let at = parse_instant("endDate", "2026-03-02T10:00:00+02:00").unwrap();
        assert_eq!(at.to_rfc3339(), "2026-03-02T08:00:00+00:00");

        let res = parse_instant("endDate", "next tuesday").unwrap_err();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }
}
