//! Commands that feed signals into a running governor
//!
//! Values are parsed locally first so typos fail fast with the list of
//! accepted names instead of a round trip.

use anyhow::Result;
use governor_lib::{ActivityContext, MemoryPressureLevel, PowerMode, ThermalState};
use std::str::FromStr;

use crate::client::{
    AcceptedResponse, ApiClient, BatteryRequest, ContextRequest, MemoryPressureRequest,
    PowerRequest, ThermalRequest,
};
use crate::output::{print_success, print_warning};

fn parse<T>(value: &str, accepted: &[T]) -> Result<T>
where
    T: FromStr<Err = governor_lib::GovernorError> + std::fmt::Display,
{
    value.parse().map_err(|e| {
        let names: Vec<String> = accepted.iter().map(ToString::to_string).collect();
        anyhow::anyhow!("{} (expected one of: {})", e, names.join(", "))
    })
}

/// Convert a battery percentage to the fraction the API expects
pub fn battery_fraction(percent: u8) -> f32 {
    f32::from(percent.min(100)) / 100.0
}

fn report_outcome(response: AcceptedResponse, message: &str) {
    if response.accepted {
        print_success(message);
    } else {
        print_warning(&format!("Governor did not accept: {}", message));
    }
}

pub async fn set_context(client: &ApiClient, context: &str) -> Result<()> {
    let context: ActivityContext = parse(context, &ActivityContext::ALL)?;
    let response: AcceptedResponse = client
        .put(
            "context",
            &ContextRequest {
                context: context.to_string(),
            },
        )
        .await?;
    report_outcome(response, &format!("Activity context set to {}", context));
    Ok(())
}

pub async fn set_power_mode(client: &ApiClient, mode: &str) -> Result<()> {
    let mode: PowerMode = parse(mode, &PowerMode::ALL)?;
    let response: AcceptedResponse = client
        .put(
            "power",
            &PowerRequest {
                mode: mode.to_string(),
            },
        )
        .await?;
    report_outcome(response, &format!("Power mode set to {}", mode));
    Ok(())
}

pub async fn set_battery(client: &ApiClient, percent: u8) -> Result<()> {
    let response: AcceptedResponse = client
        .put(
            "battery",
            &BatteryRequest {
                level: battery_fraction(percent),
            },
        )
        .await?;
    report_outcome(response, &format!("Battery level set to {}%", percent));
    Ok(())
}

pub async fn set_thermal(client: &ApiClient, state: &str) -> Result<()> {
    let state: ThermalState = parse(state, &ThermalState::ALL)?;
    let response: AcceptedResponse = client
        .post(
            "thermal",
            Some(&ThermalRequest {
                state: state.to_string(),
            }),
        )
        .await?;
    report_outcome(response, &format!("Thermal state set to {}", state));
    Ok(())
}

pub async fn memory_pressure(client: &ApiClient, level: &str) -> Result<()> {
    let level: MemoryPressureLevel = parse(level, &MemoryPressureLevel::ALL)?;
    let response: AcceptedResponse = client
        .post(
            "memory-pressure",
            Some(&MemoryPressureRequest {
                level: level.to_string(),
            }),
        )
        .await?;
    report_outcome(response, &format!("Memory pressure {} delivered", level));
    Ok(())
}

pub async fn memory_warning(client: &ApiClient) -> Result<()> {
    let response: AcceptedResponse = client.post("memory-warning", None::<&()>).await?;
    report_outcome(response, "Low-memory warning delivered");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_battery_fraction() {
        assert_eq!(battery_fraction(0), 0.0);
        assert_eq!(battery_fraction(25), 0.25);
        assert_eq!(battery_fraction(100), 1.0);
    }

    #[test]
    fn test_parse_lists_accepted_values() {
        let err = parse::<PowerMode>("turbo", &PowerMode::ALL).unwrap_err();
        let message = err.to_string();

        assert!(message.contains("turbo"));
        assert!(message.contains("normal, conservative, aggressive, extreme"));
    }

    #[test]
    fn test_parse_accepts_dashed_context() {
        let context = parse::<ActivityContext>("health-tracking", &ActivityContext::ALL).unwrap();
        assert_eq!(context, ActivityContext::HealthTracking);
    }

    #[tokio::test]
    async fn test_set_battery_sends_fraction() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("PUT", "/battery")
            .match_body(mockito::Matcher::Json(serde_json::json!({ "level": 0.25 })))
            .with_status(202)
            .with_header("content-type", "application/json")
            .with_body(r#"{"accepted":true}"#)
            .create_async()
            .await;

        let client = ApiClient::new(&server.url()).unwrap();
        set_battery(&client, 25).await.unwrap();

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_invalid_context_never_reaches_server() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("PUT", "/context")
            .expect(0)
            .create_async()
            .await;

        let client = ApiClient::new(&server.url()).unwrap();
        assert!(set_context(&client, "skydiving").await.is_err());

        mock.assert_async().await;
    }
}
