#![allow(dead_code)]

use std::sync::{Arc, Once};

use qstream_core::{criteria::define_entity, Builder, RecordingEntityManager};
use tracing_subscriber::EnvFilter;

define_entity!(
    employee {
        table: "employee",
        columns: {
            ID: i64 => "id",
            NAME: String => "name",
            SALARY: f64 => "salary",
            DEPARTMENT_ID: i64 => "department_id",
        },
        associations: {
            DEPARTMENT: to_one "department" => "department_id",
            PHONES: to_many "phone" => "employee_id",
        }
    }
);

define_entity!(
    department {
        table: "department",
        columns: {
            ID: i64 => "id",
            NAME: String => "name",
            BUDGET: f64 => "budget",
        }
    }
);

define_entity!(
    phone {
        table: "phone",
        columns: {
            ID: i64 => "id",
            NUMBER: String => "number",
            EMPLOYEE_ID: i64 => "employee_id",
        }
    }
);

static INIT: Once = Once::new();

pub fn init_tracing() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

pub fn recording() -> (Arc<RecordingEntityManager>, Builder) {
    init_tracing();
    let manager = Arc::new(RecordingEntityManager::new());
    (manager.clone(), Builder::new(manager))
}
