//! Seed fixture and store-agnostic scenarios shared by the store test suites.

#![allow(dead_code)]

use clientstore_core::{
    Client, ClientId, ClientStore, ClientValidationError, RepoError, Timestamp,
};
use std::time::{SystemTime, UNIX_EPOCH};

/// 2020-07-13T20:50:00Z
pub const BIRTH_RANGE_START: Timestamp = 1_594_673_400_000;

const SEED: &[(&str, &str, f64, Timestamp)] = &[
    ("Conceicao Evaristo", "10619244881", 1500.0, 849_559_800_000),
    ("Lazaro Ramos", "10619244884", 2500.0, 849_559_800_000),
    ("Clarice Lispector", "10919444522", 3800.0, -306_645_000_000),
    ("Carolina Maria de Jesus", "10419244771", 7500.0, 849_559_800_000),
    ("Gilberto Gil", "10419344882", 2500.0, -651_899_400_000),
    ("Djamila Ribeiro", "10619244885", 4500.0, 184_834_800_000),
    ("Jorge Amado", "10619244886", 10000.0, -1_613_754_000_000),
    ("Toni Morrison", "10219344681", 10000.0, -942_166_800_000),
    ("Chimamanda Adichie", "10114274861", 1500.0, 1_276_498_800_000),
    ("Silvio Almeida", "10164334861", 4500.0, 19_292_400_000),
    ("Jose Saramago", "10239254871", 5000.0, 849_559_800_000),
    ("Yuval Noah Harari", "10619244887", 1200.0, 1_612_162_800_000),
];

/// Saves the reference clients in order and returns their identifiers.
pub fn seed(store: &impl ClientStore) -> Vec<ClientId> {
    SEED.iter()
        .map(|(name, cpf, income, birth_date)| {
            store
                .save(&Client::new(*name, *cpf, *income, *birth_date))
                .unwrap()
        })
        .collect()
}

pub fn now_ms() -> Timestamp {
    let elapsed = SystemTime::now().duration_since(UNIX_EPOCH).unwrap();
    Timestamp::try_from(elapsed.as_millis()).unwrap()
}

fn names(clients: &[Client]) -> Vec<&str> {
    clients.iter().map(|client| client.name.as_str()).collect()
}

fn assert_ordered_by_id(clients: &[Client]) {
    let ids: Vec<_> = clients.iter().map(|client| client.id.unwrap()).collect();
    let mut sorted = ids.clone();
    sorted.sort_unstable();
    assert_eq!(ids, sorted);
}

pub fn delete_by_id_removes_existing_client(store: &impl ClientStore) {
    let ids = seed(store);

    store.delete_by_id(ids[0]).unwrap();

    assert!(store.find_by_id(ids[0]).unwrap().is_none());
    assert!(!store.exists_by_id(ids[0]).unwrap());
    assert_eq!(store.count().unwrap(), (ids.len() - 1) as u64);
}

pub fn delete_by_id_reports_missing_client(store: &impl ClientStore) {
    seed(store);

    let err = store.delete_by_id(10_000).unwrap_err();
    assert!(matches!(err, RepoError::NotFound(10_000)));
    assert_eq!(err.to_string(), "client not found: 10000");
}

pub fn delete_all_empties_the_store(store: &impl ClientStore) {
    let ids = seed(store);

    let removed = store.delete_all().unwrap();

    assert_eq!(removed, ids.len());
    assert!(store.find_all().unwrap().is_empty());
    assert_eq!(store.count().unwrap(), 0);
}

pub fn delete_entity_removes_fetched_client(store: &impl ClientStore) {
    let ids = seed(store);
    let client = store.find_by_id(ids[3]).unwrap().unwrap();

    store.delete(&client).unwrap();
    assert!(store.find_by_id(ids[3]).unwrap().is_none());

    // Already gone and never saved are both no-ops.
    store.delete(&client).unwrap();
    store
        .delete(&Client::new("Ghost", "00000000000", 0.0, 0))
        .unwrap();
    assert_eq!(store.count().unwrap(), (ids.len() - 1) as u64);
}

pub fn delete_by_cpf_removes_matching_client(store: &impl ClientStore) {
    seed(store);

    assert_eq!(store.delete_by_cpf("10619244881").unwrap(), 1);
    assert!(store.find_by_cpf("10619244881").unwrap().is_none());
    assert_eq!(store.delete_by_cpf("10619244881").unwrap(), 0);
}

pub fn find_by_cpf_returns_single_client(store: &impl ClientStore) {
    seed(store);

    let client = store.find_by_cpf("10919444522").unwrap().unwrap();
    assert_eq!(client.name, "Clarice Lispector");
    assert!(store.find_by_cpf("99999999999").unwrap().is_none());
}

pub fn delete_by_income_greater_than_leaves_no_higher_income(store: &impl ClientStore) {
    seed(store);

    let removed = store.delete_by_income_greater_than(2000.0).unwrap();

    assert_eq!(removed, 9);
    assert!(store.find_by_income_greater_than(2000.0).unwrap().is_empty());
    assert_eq!(
        names(&store.find_all().unwrap()),
        vec!["Conceicao Evaristo", "Chimamanda Adichie", "Yuval Noah Harari"]
    );
}

pub fn find_by_cpf_like_matches_prefix_in_id_order(store: &impl ClientStore) {
    seed(store);

    let clients = store.find_by_cpf_like("104%").unwrap();

    let cpfs: Vec<_> = clients.iter().map(|client| client.cpf.as_str()).collect();
    assert_eq!(cpfs, vec!["10419244771", "10419344882"]);
    assert!(store.find_by_cpf_like("999%").unwrap().is_empty());
    assert_eq!(store.find_by_cpf_like("%4882").unwrap().len(), 1);
    assert_eq!(store.find_by_cpf_like("1041_244771").unwrap().len(), 1);
}

pub fn find_by_name_is_exact_and_case_sensitive(store: &impl ClientStore) {
    seed(store);

    let clients = store.find_by_name("Jose Saramago").unwrap();
    assert_eq!(names(&clients), vec!["Jose Saramago"]);

    assert!(store.find_by_name("jose saramago").unwrap().is_empty());
    assert!(store.find_by_name("Jose").unwrap().is_empty());
}

pub fn find_by_income_greater_than_is_strict(store: &impl ClientStore) {
    seed(store);

    let clients = store.find_by_income_greater_than(2500.0).unwrap();

    assert_eq!(clients.len(), 7);
    assert!(clients.iter().all(|client| client.income > 2500.0));
    assert!(names(&clients).contains(&"Silvio Almeida"));
    assert!(!names(&clients).contains(&"Lazaro Ramos"));
    assert_ordered_by_id(&clients);
}

pub fn find_by_income_less_than_is_strict(store: &impl ClientStore) {
    seed(store);

    let clients = store.find_by_income_less_than(1600.0).unwrap();

    assert_eq!(
        names(&clients),
        vec!["Conceicao Evaristo", "Chimamanda Adichie", "Yuval Noah Harari"]
    );
    assert!(store.find_by_income_less_than(1200.0).unwrap().is_empty());
}

pub fn find_by_income_between_is_inclusive(store: &impl ClientStore) {
    seed(store);

    let between = store.find_by_income_between(1500.0, 2500.0).unwrap();

    assert_eq!(
        names(&between),
        vec![
            "Conceicao Evaristo",
            "Lazaro Ramos",
            "Gilberto Gil",
            "Chimamanda Adichie"
        ]
    );
    assert!(between
        .iter()
        .all(|client| (1500.0..=2500.0).contains(&client.income)));

    let above = store.find_by_income_greater_than(1500.0).unwrap();
    let below = store.find_by_income_less_than(2500.0).unwrap();
    assert!(between
        .iter()
        .all(|client| above.contains(client) || below.contains(client)));

    assert!(store.find_by_income_between(2500.0, 1500.0).unwrap().is_empty());
}

pub fn find_by_birth_date_between_is_inclusive(store: &impl ClientStore) {
    seed(store);

    let now = now_ms();
    let recent = store
        .find_by_birth_date_between(BIRTH_RANGE_START, now)
        .unwrap();
    assert_eq!(names(&recent), vec!["Yuval Noah Harari"]);
    assert!(recent
        .iter()
        .all(|client| (BIRTH_RANGE_START..=now).contains(&client.birth_date)));

    let exact = store
        .find_by_birth_date_between(849_559_800_000, 849_559_800_000)
        .unwrap();
    assert_eq!(exact.len(), 4);
    assert_ordered_by_id(&exact);
}

pub fn save_updates_income_of_fetched_client(store: &impl ClientStore) {
    let ids = seed(store);
    let mut client = store.find_by_id(ids[0]).unwrap().unwrap();

    client.income = 2000.0;
    let saved_id = store.save(&client).unwrap();

    assert_eq!(saved_id, ids[0]);
    let reloaded = store.find_by_id(ids[0]).unwrap().unwrap();
    assert_eq!(reloaded.income, 2000.0);
    assert_eq!(reloaded, client);
    assert_eq!(store.count().unwrap(), ids.len() as u64);
}

pub fn save_with_unknown_id_inserts_under_that_id(store: &impl ClientStore) {
    let ids = seed(store);
    let next_free = ids.iter().max().unwrap() + 100;

    let client = Client::with_id(next_free, "Ailton Krenak", "10000000001", 3000.0, 0);
    assert_eq!(store.save(&client).unwrap(), next_free);
    assert_eq!(store.find_by_id(next_free).unwrap().unwrap(), client);

    let generated = store
        .save(&Client::new("Sueli Carneiro", "10000000002", 3100.0, 0))
        .unwrap();
    assert!(generated > next_free);
}

pub fn save_rejects_cpf_owned_by_another_client(store: &impl ClientStore) {
    let ids = seed(store);

    let err = store
        .save(&Client::new("Impostor", "10419244771", 100.0, 0))
        .unwrap_err();
    assert!(matches!(err, RepoError::DuplicateCpf(_)));

    let mut other = store.find_by_id(ids[0]).unwrap().unwrap();
    other.cpf = "10419244771".to_string();
    assert!(matches!(
        store.save(&other).unwrap_err(),
        RepoError::DuplicateCpf(_)
    ));

    assert_eq!(store.count().unwrap(), ids.len() as u64);
    assert_eq!(
        store.find_by_id(ids[0]).unwrap().unwrap().cpf,
        "10619244881"
    );
}

pub fn generated_ids_are_not_reused_after_delete(store: &impl ClientStore) {
    let first = store
        .save(&Client::new("Ana", "11111111111", 1000.0, 0))
        .unwrap();
    store.delete_by_id(first).unwrap();

    let second = store
        .save(&Client::new("Bia", "22222222222", 1000.0, 0))
        .unwrap();
    assert!(second > first);
}

pub fn save_rejects_non_finite_income(store: &impl ClientStore) {
    let ids = seed(store);

    for income in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
        let err = store
            .save(&Client::new("Ana", "11111111111", income, 0))
            .unwrap_err();
        assert!(matches!(
            err,
            RepoError::Validation(ClientValidationError::NonFiniteIncome)
        ));
    }

    let mut existing = store.find_by_id(ids[0]).unwrap().unwrap();
    existing.income = f64::NAN;
    assert!(matches!(
        store.save(&existing).unwrap_err(),
        RepoError::Validation(_)
    ));

    assert_eq!(store.count().unwrap(), ids.len() as u64);
    assert_eq!(store.find_by_id(ids[0]).unwrap().unwrap().income, 1500.0);
}

pub fn save_reports_exhausted_id_space(store: &impl ClientStore) {
    let last = Client::with_id(ClientId::MAX, "Ana", "11111111111", 1000.0, 0);
    assert_eq!(store.save(&last).unwrap(), ClientId::MAX);
    assert_eq!(store.find_by_id(ClientId::MAX).unwrap().unwrap(), last);

    let err = store
        .save(&Client::new("Bia", "22222222222", 1000.0, 0))
        .unwrap_err();
    assert!(matches!(err, RepoError::IdSpaceExhausted));

    // Explicit identifiers below the maximum are still free.
    assert_eq!(
        store
            .save(&Client::with_id(5, "Caio", "33333333333", 1000.0, 0))
            .unwrap(),
        5
    );
    assert_eq!(store.count().unwrap(), 2);
}
