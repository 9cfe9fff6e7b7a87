//! Drives the manager purely through the `strata_dbms` facade.

use std::sync::Arc;
use strata_dbms::{
    DatabaseAccessChecker, DatabaseId, DatabaseInstance, DatabaseLifecycles, DatabaseRecord,
    DatabaseRuntimeManager, DbmsConfig, GrantEdge, InstanceFactory, InstanceOptions,
    InstanceState, MemoryCatalog, PhaseRunner, StrataResult,
};
use uuid::Uuid;

struct Inert(DatabaseId);

impl DatabaseInstance for Inert {
    fn id(&self) -> &DatabaseId {
        &self.0
    }

    fn start(&self) -> StrataResult<()> {
        Ok(())
    }

    fn stop(&self) -> StrataResult<()> {
        Ok(())
    }
}

struct InertFactory;

impl InstanceFactory for InertFactory {
    fn create(
        &self,
        id: &DatabaseId,
        _options: Option<&InstanceOptions>,
    ) -> StrataResult<Arc<dyn DatabaseInstance>> {
        Ok(Arc::new(Inert(id.clone())))
    }
}

#[test]
fn test_server_lifetime() {
    let config = DbmsConfig {
        admin_user: "root".to_string(),
        ..DbmsConfig::default()
    };
    let catalog = Arc::new(MemoryCatalog::new());
    catalog
        .declare_database(DatabaseRecord::new(config.default_database.clone(), Uuid::new_v4()))
        .unwrap();
    catalog
        .declare_database(DatabaseRecord::new("reports", Uuid::new_v4()))
        .unwrap();
    catalog.add_grant(GrantEdge::user("dana", "reports")).unwrap();

    let dbms = Arc::new(DatabaseLifecycles::new(&config, Arc::new(InertFactory), catalog).unwrap());
    let mut runner = PhaseRunner::new(Arc::clone(&dbms));
    runner.register(DatabaseLifecycles::system_database_starter());
    runner.register(DatabaseLifecycles::default_database_starter());
    runner.register(DatabaseLifecycles::all_database_stopper());
    runner.init().unwrap();
    runner.start().unwrap();

    let checker: &dyn DatabaseAccessChecker = &*dbms;
    assert!(checker.can_user_access_database("dana", "reports"));
    assert!(checker.can_user_access_database("root", "reports"));
    assert!(!checker.can_user_access_database("admin", "reports"));

    let manager: &dyn DatabaseRuntimeManager = &*dbms;
    manager
        .create_and_start_database("tenant1", Uuid::new_v4(), "erin")
        .unwrap();
    checker.grant_user_access_to_database("frank", "tenant1");
    assert!(checker.can_user_access_database("frank", "tenant1"));
    checker.revoke_user_access_to_database("erin", "tenant1");
    assert!(!checker.can_user_access_database("erin", "tenant1"));

    let names: Vec<String> = dbms.list_databases().into_iter().map(|h| h.name).collect();
    assert_eq!(names, vec!["default", "reports", "system", "tenant1"]);

    runner.stop().unwrap();
    runner.shutdown().unwrap();
    assert!(dbms
        .list_databases()
        .iter()
        .all(|h| h.state == InstanceState::Stopped));
}
