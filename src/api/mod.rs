//! HTTP API over the calculator and the associated companies advisor.

use axum::{
    extract::{rejection::QueryRejection, Json, Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;

use crate::core::{
    AssociatedCompaniesAdvisor, CalculationRequest, ConfigurationTable, MarginalReliefCalculator,
    Period,
};

#[derive(Clone)]
pub struct AppState {
    config: Arc<ConfigurationTable>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarginalReliefParams {
    accounting_period_start: NaiveDate,
    accounting_period_end: NaiveDate,
    profit: Decimal,
    #[serde(default)]
    exempt_distributions: Option<Decimal>,
    #[serde(default)]
    associated_companies: Option<i64>,
    #[serde(default, rename = "associatedCompaniesFY1")]
    associated_companies_fy1: Option<i64>,
    #[serde(default, rename = "associatedCompaniesFY2")]
    associated_companies_fy2: Option<i64>,
}

impl From<MarginalReliefParams> for CalculationRequest {
    fn from(params: MarginalReliefParams) -> Self {
        CalculationRequest {
            accounting_period_start: params.accounting_period_start,
            accounting_period_end: params.accounting_period_end,
            profit: params.profit,
            exempt_distributions: params.exempt_distributions.unwrap_or(Decimal::ZERO),
            associated_companies: params.associated_companies,
            associated_companies_fy1: params.associated_companies_fy1,
            associated_companies_fy2: params.associated_companies_fy2,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountingPeriodParams {
    accounting_period_start: NaiveDate,
    accounting_period_end: NaiveDate,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Debug, Serialize)]
struct ErrorsResponse {
    errors: Vec<String>,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
}

pub fn router(config: ConfigurationTable) -> Router {
    let state = AppState {
        config: Arc::new(config),
    };
    Router::new()
        .route("/marginal-relief", get(marginal_relief_handler))
        .route(
            "/ask-params/associated-companies",
            get(associated_companies_handler),
        )
        .route("/config/:year", get(config_handler))
        .route("/health", get(health_handler))
        .fallback(not_found_handler)
        .with_state(state)
}

pub async fn run_http_server(config: ConfigurationTable, port: u16) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let app = router(config);

    let listener = TcpListener::bind(addr).await?;
    log::info!("Marginal relief API listening on http://{addr}");

    axum::serve(listener, app).await
}

async fn marginal_relief_handler(
    State(state): State<AppState>,
    query: Result<Query<MarginalReliefParams>, QueryRejection>,
) -> Response {
    match query {
        Ok(Query(params)) => marginal_relief_response(&state.config, params.into()),
        Err(rejection) => bad_request(&rejection.body_text()),
    }
}

async fn associated_companies_handler(
    State(state): State<AppState>,
    query: Result<Query<AccountingPeriodParams>, QueryRejection>,
) -> Response {
    match query {
        Ok(Query(params)) => {
            let period = Period::new(params.accounting_period_start, params.accounting_period_end);
            associated_companies_response(&state.config, period)
        }
        Err(rejection) => bad_request(&rejection.body_text()),
    }
}

async fn config_handler(State(state): State<AppState>, Path(year): Path<i32>) -> Response {
    match state.config.get(year) {
        Some(config) => json_response(StatusCode::OK, config),
        None => error_response(
            StatusCode::NOT_FOUND,
            &format!("No configuration found for financial year {year}"),
        ),
    }
}

async fn health_handler() -> Response {
    json_response(StatusCode::OK, HealthResponse { status: "ok" })
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

fn marginal_relief_response(config: &ConfigurationTable, request: CalculationRequest) -> Response {
    if let Err(e) = request.validate() {
        return bad_request(&e.to_string());
    }
    match MarginalReliefCalculator::new(config).compute(&request) {
        Ok(result) => json_response(StatusCode::OK, result),
        Err(e) => error_response(StatusCode::UNPROCESSABLE_ENTITY, &e.to_string()),
    }
}

fn associated_companies_response(config: &ConfigurationTable, period: Period) -> Response {
    if let Err(e) = period.validate() {
        return bad_request(&e.to_string());
    }
    match AssociatedCompaniesAdvisor::new(config).requirement(&period) {
        Ok(requirement) => json_response(StatusCode::OK, requirement),
        Err(errors) => json_response(
            StatusCode::UNPROCESSABLE_ENTITY,
            ErrorsResponse {
                errors: errors.iter().map(|e| e.to_string()).collect(),
            },
        ),
    }
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    let mut response = (status, Json(body)).into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        header::HeaderValue::from_static("no-store"),
    );
    response
}

fn bad_request(msg: &str) -> Response {
    log::debug!("Rejected request: {msg}");
    error_response(StatusCode::BAD_REQUEST, msg)
}

fn error_response(status: StatusCode, msg: &str) -> Response {
    json_response(
        status,
        ErrorResponse {
            error: msg.to_string(),
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::{FlatRateConfig, MarginalReliefConfig};
    use crate::core::FinancialYearConfig;
    use axum::http::Uri;
    use rust_decimal_macros::dec;
    use serde_json::Value;

    fn config() -> ConfigurationTable {
        ConfigurationTable::new(vec![
            FinancialYearConfig::FlatRate(FlatRateConfig {
                year: 2022,
                main_rate: dec!(0.19),
            }),
            FinancialYearConfig::MarginalRelief(MarginalReliefConfig {
                year: 2023,
                lower_threshold: dec!(50000),
                upper_threshold: dec!(250000),
                small_profit_rate: dec!(0.19),
                main_rate: dec!(0.25),
                marginal_relief_fraction: dec!(0.015),
            }),
        ])
        .unwrap()
    }

    fn params(query: &str) -> MarginalReliefParams {
        let uri: Uri = format!("/marginal-relief?{query}").parse().unwrap();
        Query::<MarginalReliefParams>::try_from_uri(&uri).unwrap().0
    }

    async fn body_json(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn query_parameter_names() {
        let p = params(
            "accountingPeriodStart=2023-10-01&accountingPeriodEnd=2024-09-30&profit=100000.50\
             &exemptDistributions=10&associatedCompaniesFY1=1&associatedCompaniesFY2=2",
        );
        let request: CalculationRequest = p.into();
        assert_eq!(request.profit, dec!(100000.50));
        assert_eq!(request.exempt_distributions, dec!(10));
        assert_eq!(request.associated_companies, None);
        assert_eq!(request.associated_companies_fy1, Some(1));
        assert_eq!(request.associated_companies_fy2, Some(2));
    }

    #[test]
    fn exempt_distributions_default_to_zero() {
        let p = params("accountingPeriodStart=2023-04-01&accountingPeriodEnd=2024-03-31&profit=1");
        let request: CalculationRequest = p.into();
        assert_eq!(request.exempt_distributions, Decimal::ZERO);
    }

    #[tokio::test]
    async fn single_result_response() {
        let p = params("accountingPeriodStart=2023-04-01&accountingPeriodEnd=2024-03-31&profit=60000");
        let response = marginal_relief_response(&config(), p.into());
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        assert_eq!(json["type"], "SingleResult");
        assert_eq!(json["corporationTaxBeforeMR"], 15000.0);
        assert_eq!(json["corporationTax"], 12150.0);
        assert_eq!(json["effectiveRate"], 20.25);
        assert_eq!(json["marginalRelief"], 2850.0);
    }

    #[tokio::test]
    async fn dual_result_response() {
        let p = params("accountingPeriodStart=2023-01-01&accountingPeriodEnd=2023-12-31&profit=73000");
        let response = marginal_relief_response(&config(), p.into());
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        assert_eq!(json["type"], "DualResult");
        assert_eq!(json["yearOne"]["year"], 2022);
        assert_eq!(json["yearTwo"]["year"], 2023);
        assert_eq!(json["yearTwo"]["marginalRelief"], 2000.34);
    }

    #[tokio::test]
    async fn missing_configuration_is_unprocessable() {
        let p = params("accountingPeriodStart=2021-04-01&accountingPeriodEnd=2022-03-31&profit=1");
        let response = marginal_relief_response(&config(), p.into());
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let json = body_json(response).await;
        assert_eq!(
            json["error"],
            "Configuration missing for financial year(s): 2021"
        );
    }

    #[test]
    fn invalid_request_is_bad_request() {
        let p = params("accountingPeriodStart=2023-04-01&accountingPeriodEnd=2023-03-31&profit=1");
        let response = marginal_relief_response(&config(), p.into());
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let p = params("accountingPeriodStart=2023-04-01&accountingPeriodEnd=2024-03-31&profit=-1");
        let response = marginal_relief_response(&config(), p.into());
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn out_of_range_inputs_are_bad_request() {
        let p = params(
            "accountingPeriodStart=2023-04-01&accountingPeriodEnd=2024-03-31&profit=60000\
             &associatedCompanies=9223372036854775807",
        );
        let response = marginal_relief_response(&config(), p.into());
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let p = params(
            "accountingPeriodStart=2023-04-01&accountingPeriodEnd=2024-03-31\
             &profit=79228162514264337593543950335&exemptDistributions=79228162514264337593543950335",
        );
        let response = marginal_relief_response(&config(), p.into());
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert!(json["error"]
            .as_str()
            .is_some_and(|e| e.starts_with("profit")));
    }

    #[tokio::test]
    async fn associated_companies_one_period() {
        let period = Period::new(
            NaiveDate::from_ymd_opt(2022, 10, 1).unwrap(),
            NaiveDate::from_ymd_opt(2023, 9, 30).unwrap(),
        );
        let response = associated_companies_response(&config(), period);
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        assert_eq!(json["type"], "OnePeriod");
        assert_eq!(json["period"]["start"], "2023-04-01");
        assert_eq!(json["period"]["end"], "2023-09-30");
    }

    #[tokio::test]
    async fn associated_companies_lists_every_missing_year() {
        let period = Period::new(
            NaiveDate::from_ymd_opt(2024, 10, 1).unwrap(),
            NaiveDate::from_ymd_opt(2025, 9, 30).unwrap(),
        );
        let response = associated_companies_response(&config(), period);
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let json = body_json(response).await;
        assert_eq!(json["errors"].as_array().map(|e| e.len()), Some(2));
    }

    #[tokio::test]
    async fn config_lookup() {
        let state = AppState {
            config: Arc::new(config()),
        };
        let response = config_handler(State(state.clone()), Path(2023)).await;
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["type"], "MarginalRelief");
        assert_eq!(json["upper_threshold"], 250000.0);

        let response = config_handler(State(state), Path(2030)).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn health_and_unknown_routes() {
        let response = health_handler().await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::CACHE_CONTROL).unwrap(),
            "no-store"
        );
        assert_eq!(body_json(response).await["status"], "ok");

        let response = not_found_handler().await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(response).await["error"], "Not found");
    }
}
