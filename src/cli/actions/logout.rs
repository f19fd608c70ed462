use crate::cli::globals::GlobalArgs;
use crate::store::{LogoutReason, StateStore};
use anyhow::Result;

/// Handle the logout action: record the notice for the next sign-in and
/// forget the tenant so the next run goes through selection again.
pub fn handle(globals: &GlobalArgs) -> Result<()> {
    let store = StateStore::open(&globals.state_dir)?;
    store.record_logout(LogoutReason::LoggedOut)?;

    let mut preferences = store.load_preferences()?;
    if preferences.last_tenant.take().is_some() {
        store.save_preferences(&preferences)?;
    }

    println!("Signed out");
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn logout_records_notice_and_clears_tenant() {
        let dir = tempfile::tempdir().unwrap();
        let store = StateStore::open(dir.path()).unwrap();
        let mut preferences = store.load_preferences().unwrap();
        preferences.last_tenant = Some("acme".to_string());
        store.save_preferences(&preferences).unwrap();

        let globals = GlobalArgs::new(dir.path().to_path_buf());
        handle(&globals).unwrap();

        let store = StateStore::open(dir.path()).unwrap();
        assert!(store.load_preferences().unwrap().last_tenant.is_none());
        assert_eq!(
            store.take_logout_notice().unwrap(),
            Some(LogoutReason::LoggedOut)
        );
    }
}
