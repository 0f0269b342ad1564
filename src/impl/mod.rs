// Crate-internal.
// ---

pub(crate) mod data {
    pub mod in_memory_contract_repository;
    pub mod in_memory_lms_client;
}

pub(crate) mod domain {
    pub(crate) mod entities {
        pub(crate) mod accrual;
        pub(crate) mod accrued_period;
        pub(crate) mod client;
        pub(crate) mod contract;
        pub(crate) mod invoice;
        pub(crate) mod lms;
        pub(crate) mod notification;
        pub(crate) mod period;
        pub(crate) mod result;
        pub(crate) mod service;
    }
    pub(crate) mod temporal;
    pub(crate) mod logic {
        pub(crate) mod aggregate_mutator;
        pub(crate) mod lms_reconciler;
        pub(crate) mod period_arbiter;
        pub(crate) mod processor;
        pub(crate) mod session_allocator;
        pub(crate) mod status;
    }
    pub(crate) mod repositories {
        pub(crate) mod contract_repository;
        pub(crate) mod lms_client;
    }
    pub(crate) mod usecases {
        pub(crate) mod batch_driver;
    }
}

pub(crate) mod presentation {
    pub(crate) mod batch_report;
}

// Public exports.
// ---

#[doc(hidden)]
#[allow(unused_imports)]
pub mod exports {
    // This mod represents how clients see the library, and can differ from the
    // internal structure.
    //
    // The contents of this mod are re-exported in the root of the crate.

    pub mod entities {
        pub use crate::domain::entities::accrual::*;
        pub use crate::domain::entities::accrued_period::*;
        pub use crate::domain::entities::client::*;
        pub use crate::domain::entities::contract::*;
        pub use crate::domain::entities::invoice::*;
        pub use crate::domain::entities::lms::*;
        pub use crate::domain::entities::notification::*;
        pub use crate::domain::entities::period::*;
        pub use crate::domain::entities::result::*;
        pub use crate::domain::entities::service::*;
    }

    pub mod logic {
        pub use crate::domain::logic::status::*;
    }

    pub mod repositories {
        pub use crate::domain::repositories::contract_repository::*;
        pub use crate::domain::repositories::lms_client::*;
    }

    pub mod usecases {
        pub use crate::domain::usecases::batch_driver::*;
    }

    pub mod temporal {
        pub use crate::domain::temporal::*;
    }

    pub mod backends {
        pub use crate::data::in_memory_contract_repository::InMemoryContractRepository;
        pub use crate::data::in_memory_lms_client::InMemoryLmsClient;
    }
}
