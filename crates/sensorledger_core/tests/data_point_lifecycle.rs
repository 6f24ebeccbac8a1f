use sensorledger_core::{
    ContractError, DataPoint, DataPointService, MemoryStateStore, StateStore, ValidationError,
};

const X_ALERT: &str =
    "Temperature alert! Data point x has a temperature of 25°C, exceeding the threshold of 20°C.";

fn service() -> DataPointService<MemoryStateStore> {
    DataPointService::new(MemoryStateStore::new())
}

#[test]
fn add_then_read_returns_inputs_with_alert() {
    let service = service();
    service.add_data_point("x", 25.0, "Org1").unwrap();

    let stored = service.get_data_point("x").unwrap();
    assert_eq!(stored, DataPoint::new("x", 25.0, X_ALERT, "Org1"));
    assert_eq!(stored.doc_type, "dataPoint");
}

#[test]
fn add_at_or_below_threshold_has_empty_alert() {
    let service = service();
    service.add_data_point("y", 15.0, "Org1").unwrap();
    service.add_data_point("edge", 20.0, "Org1").unwrap();

    assert_eq!(service.get_data_point("y").unwrap().alert, "");
    assert_eq!(service.get_data_point("edge").unwrap().alert, "");
}

#[test]
fn read_returns_canonical_sorted_json() {
    let service = service();
    service.add_data_point("y", 15.0, "Org1").unwrap();

    let text = service.read_data_point("y").unwrap();
    assert_eq!(
        text,
        r#"{"Alert":"","ID":"y","Owner":"Org1","Temperature":15,"docType":"dataPoint"}"#
    );
}

#[test]
fn add_existing_id_fails_and_keeps_original() {
    let service = service();
    service.add_data_point("x", 25.0, "Org1").unwrap();
    let before = service.read_data_point("x").unwrap();

    let err = service.add_data_point("x", 10.0, "Org9").unwrap_err();
    assert!(matches!(err, ContractError::AlreadyExists(id) if id == "x"));
    assert_eq!(service.read_data_point("x").unwrap(), before);
}

#[test]
fn missing_id_is_not_found_everywhere() {
    let service = service();

    let err = service.read_data_point("nope").unwrap_err();
    assert!(matches!(err, ContractError::NotFound(ref id) if id == "nope"));
    let err = service.update_data_point("nope", 10.0).unwrap_err();
    assert!(matches!(err, ContractError::NotFound(_)));
    let err = service.delete_data_point("nope").unwrap_err();
    assert!(matches!(err, ContractError::NotFound(_)));
    let err = service.transfer_data_point("nope", "Org3").unwrap_err();
    assert!(matches!(err, ContractError::NotFound(_)));

    assert!(service.store().is_empty().unwrap());
}

#[test]
fn invalid_arguments_are_rejected_before_lookup() {
    let service = service();

    let err = service.read_data_point("").unwrap_err();
    assert!(matches!(
        err,
        ContractError::InvalidArgument(ValidationError::EmptyId)
    ));
    let err = service.update_data_point("", 10.0).unwrap_err();
    assert!(matches!(err, ContractError::InvalidArgument(_)));
    let err = service.delete_data_point("").unwrap_err();
    assert!(matches!(err, ContractError::InvalidArgument(_)));
    let err = service.transfer_data_point("", "Org3").unwrap_err();
    assert!(matches!(err, ContractError::InvalidArgument(_)));

    // Range check wins over NotFound for a missing record.
    let err = service.update_data_point("missing", -60.0).unwrap_err();
    assert!(matches!(
        err,
        ContractError::InvalidArgument(ValidationError::TemperatureOutOfRange(_))
    ));
    let err = service.add_data_point("nan", f64::NAN, "Org1").unwrap_err();
    assert!(matches!(err, ContractError::InvalidArgument(_)));
}

#[test]
fn update_raises_alert_once_and_never_clears_it() {
    let service = service();
    service.add_data_point("x", 10.0, "Org1").unwrap();

    let updated = service.update_data_point("x", 25.0).unwrap();
    assert_eq!(updated.alert, X_ALERT);

    let cooled = service.update_data_point("x", 5.0).unwrap();
    assert_eq!(cooled.temperature, 5.0);
    assert_eq!(cooled.alert, X_ALERT);

    let reheated = service.update_data_point("x", 40.0).unwrap();
    assert_eq!(reheated.temperature, 40.0);
    assert_eq!(reheated.alert, X_ALERT, "existing alert is not refreshed");

    assert_eq!(service.get_data_point("x").unwrap(), reheated);
}

#[test]
fn update_below_threshold_keeps_empty_alert() {
    let service = service();
    service.add_data_point("y", 15.0, "Org1").unwrap();

    let updated = service.update_data_point("y", 19.5).unwrap();
    assert_eq!(updated.alert, "");
    assert_eq!(updated.owner, "Org1");
}

#[test]
fn transfer_changes_only_owner() {
    let service = service();
    service.add_data_point("x", 25.0, "Org1").unwrap();

    service.transfer_data_point("x", "Org3").unwrap();
    let stored = service.get_data_point("x").unwrap();
    assert_eq!(stored.owner, "Org3");
    assert_eq!(stored.temperature, 25.0);
    assert_eq!(stored.alert, X_ALERT);
}

#[test]
fn transfer_accepts_empty_new_owner() {
    let service = service();
    service.add_data_point("x", 25.0, "Org1").unwrap();

    let stored = service.transfer_data_point("x", "").unwrap();
    assert_eq!(stored.owner, "");
}

#[test]
fn delete_removes_record() {
    let service = service();
    service.add_data_point("x", 25.0, "Org1").unwrap();
    assert!(service.data_point_exists("x").unwrap());

    service.delete_data_point("x").unwrap();
    assert!(!service.data_point_exists("x").unwrap());
    assert_eq!(service.store().get_state("x").unwrap(), None);

    let err = service.delete_data_point("x").unwrap_err();
    assert!(matches!(err, ContractError::NotFound(_)));
}

#[test]
fn deleted_id_can_be_added_again() {
    let service = service();
    service.add_data_point("x", 25.0, "Org1").unwrap();
    service.delete_data_point("x").unwrap();

    let fresh = service.add_data_point("x", 12.0, "Org2").unwrap();
    assert_eq!(fresh.alert, "");
    assert_eq!(fresh.owner, "Org2");
}

#[test]
fn init_ledger_seeds_five_records_without_alerts() {
    let service = service();
    service.init_ledger().unwrap();

    let expected = [
        ("data1", 20.0),
        ("data2", 25.0),
        ("data3", 18.0),
        ("data4", 22.0),
        ("data5", 24.0),
    ];
    for (id, temperature) in expected {
        let stored = service.get_data_point(id).unwrap();
        assert_eq!(stored, DataPoint::new(id, temperature, "", "Org1"));
    }
    assert_eq!(service.store().len().unwrap(), 5);
}

#[test]
fn init_ledger_overwrites_seed_keys_and_keeps_others() {
    let service = service();
    service.init_ledger().unwrap();
    service.update_data_point("data2", 30.0).unwrap();
    service.add_data_point("extra", 5.0, "Org4").unwrap();

    service.init_ledger().unwrap();

    let reseeded = service.get_data_point("data2").unwrap();
    assert_eq!(reseeded, DataPoint::new("data2", 25.0, "", "Org1"));
    assert!(service.data_point_exists("extra").unwrap());
    assert_eq!(service.store().len().unwrap(), 6);
}
