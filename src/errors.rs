use chrono::NaiveDate;
use fractic_server_error::define_client_error;

// Input-shape failures (rejected at the batch boundary, never enter the core).
define_client_error!(InvalidIsoDate, "Invalid ISO date: {date}.", { date: &str });
define_client_error!(
    MissingMandatoryField,
    "Missing mandatory field '{field}' on {entity}.",
    { field: &str, entity: &str }
);

// Store failures (uniqueness violation, connectivity) - rolled back per
// contract, surfaced as a FAILED result rather than propagated.
define_client_error!(StoreError, "Accrual store failure: {message}.", { message: &str });
define_client_error!(
    DuplicateAccruedPeriod,
    "An AccruedPeriod already exists for contract_accrual {contract_accrual_id}, period {period_label}, month {accrual_date}.",
    { contract_accrual_id: i64, period_label: &str, accrual_date: &NaiveDate }
);

// External-source unavailability is deliberately NOT an error: an
// unreachable LMS is folded into "LMS record missing" and handled by
// the resignation path, never raised as a failure.
