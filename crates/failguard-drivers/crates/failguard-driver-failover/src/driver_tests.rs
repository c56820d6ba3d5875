//! Unit tests for the failover driver

use super::*;
use crate::scripted::{Behavior, Event, ScriptedDriver};
use failguard_core::{DatabaseDriver, FailguardError};
use pretty_assertions::assert_eq;
use std::sync::Arc;

const PRIMARY: &str = "host=primary port=5432 dbname=app";
const REPLICA: &str = "host=replica port=5432 dbname=app";

#[test]
fn test_failover_driver_name() {
    let scripted = ScriptedDriver::new(&[]);
    let driver = FailoverDriver::new(scripted);

    assert_eq!(driver.name(), "postgres-with-failover");
    assert_eq!(driver.display_name(), "Read/write failover");
    assert_eq!(driver.delegate().name(), "scripted");
    assert_eq!(driver.config(), &FailoverConfig::default());
}

#[test]
fn test_failover_driver_custom_name() {
    let driver = FailoverDriver::with_config(
        ScriptedDriver::new(&[]),
        FailoverConfig::default().with_driver_name("pg-rw"),
    );
    assert_eq!(driver.name(), "pg-rw");
}

#[tokio::test]
async fn test_open_splits_and_fails_over() {
    let scripted = ScriptedDriver::new(&[
        (PRIMARY, Behavior::ReadOnly),
        (REPLICA, Behavior::Writable),
    ]);
    let driver = FailoverDriver::new(scripted.clone());

    let conn = driver
        .open(&join_endpoints(&[PRIMARY, REPLICA]))
        .await
        .expect("replica was promoted");

    assert!(!conn.is_closed());
    assert_eq!(scripted.connections_for(PRIMARY).len(), 1);
    assert_eq!(scripted.connections_for(REPLICA).len(), 2);
}

#[tokio::test]
async fn test_open_empty_descriptor_surfaces_delegate_error() {
    let scripted = ScriptedDriver::new(&[]);
    let driver = FailoverDriver::new(scripted.clone());

    let err = driver.open("").await.err().unwrap();

    assert!(matches!(err, FailguardError::Connection(_)));
    assert_eq!(
        scripted.events(),
        vec![Event::OpenFailed {
            endpoint: String::new()
        }]
    );
}

#[tokio::test]
async fn test_every_open_reprobes() {
    let scripted = ScriptedDriver::new(&[(PRIMARY, Behavior::Writable)]);
    let driver = FailoverDriver::new(scripted.clone());

    for _ in 0..3 {
        let conn = driver.open(PRIMARY).await.unwrap();
        conn.close().await.unwrap();
    }

    // probe + live per call, nothing remembered between calls
    assert_eq!(scripted.connections_for(PRIMARY).len(), 6);
}

#[tokio::test]
async fn test_test_connection_goes_through_failover() {
    let scripted = ScriptedDriver::new(&[
        (PRIMARY, Behavior::Unreachable),
        (REPLICA, Behavior::Writable),
    ]);
    let driver = Arc::new(FailoverDriver::new(scripted.clone()));

    driver
        .test_connection(&join_endpoints(&[PRIMARY, REPLICA]))
        .await
        .unwrap();

    let live = scripted.connections_for(REPLICA)[1];
    assert!(scripted.events().contains(&Event::Query {
        conn: live,
        sql: "SELECT 1".to_string(),
    }));
    assert_eq!(scripted.close_count(live), 1);
}

#[tokio::test]
async fn test_survey_through_driver() {
    let scripted = ScriptedDriver::new(&[
        (PRIMARY, Behavior::ReadOnly),
        (REPLICA, Behavior::Writable),
    ]);
    let driver = FailoverDriver::new(scripted);

    let reports = driver.survey(&join_endpoints(&[PRIMARY, REPLICA])).await;

    assert_eq!(reports.len(), 2);
    assert!(matches!(reports[0].readiness, Readiness::ReadOnly));
    assert!(reports[1].readiness.is_writable());
}
