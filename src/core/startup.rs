use anyhow::Result;
use tracing::info;

use crate::core::state::AppState;
use crate::wal::wal::WalOperation;

// this runs at boot time
pub fn apply_wal_operations(state: &AppState, operations: &[WalOperation]) -> Result<()> {
    for op in operations {
        match op {
            WalOperation::PutUser { user } => {
                state.users.restore(user.clone());
            }
            WalOperation::RemoveUser { id } => {
                state.users.forget(*id);
                state.images.purge_user(*id);
                state.results.purge_user(*id);
            }
            WalOperation::AddImage { image } => {
                state.images.restore(image.clone());
            }
            WalOperation::AddResult { result } => {
                state.results.restore(result.clone());
            }
            WalOperation::RemoveResult { id } => {
                state.results.forget(*id);
            }
        }
    }

    info!(
        users = state.users.len(),
        image_locations = state.images.len(),
        results = state.results.len(),
        "Stores rebuilt from WAL"
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::Config;
    use crate::models::user::Role;
    use crate::services::reputation::ReputationChange;
    use crate::services::analyzer::Analysis;
    use crate::models::image::NewImageLocation;
    use crate::wal::wal::Wal;
    use tempfile::TempDir;

    fn test_config(wal_path: &str) -> Config {
        let content = format!(
            "[server]\nport = 8080\n[auth]\njwt_secret = \"KioqKioqKioqKioqKioqKioqKioqKioqKioqKioqKio=\"\n\
             hash_memory_kib = 64\nhash_iterations = 1\n[storage]\nwal_path = \"{}\"\n",
            wal_path
        );
        Config::from_toml(&content).unwrap()
    }

    #[tokio::test]
    async fn test_replay_restores_all_stores() {
        let temp_dir = TempDir::new().unwrap();
        let wal_path = temp_dir.path().join("app.wal");
        let config = test_config(&wal_path.display().to_string());

        let (alice_id, bob_id) = {
            let state = AppState::new(config.clone(), Wal::new(wal_path.clone()).unwrap()).unwrap();
            let alice = state.users.create("alice@x.com", "pw1", Role::User).await.unwrap();
            let bob = state.users.create("bob@x.com", "pw2", Role::User).await.unwrap();

            let location = NewImageLocation { latitude: 1.0, longitude: 2.0, image: vec![1] };
            state.images.insert(alice.id, location.clone()).unwrap();
            state.images.insert(bob.id, location).unwrap();

            let analysis = Analysis { vegetation_loss_percent: 7.0, poisoning_detected: false };
            let kept = state.results.insert(alice.id, &analysis).unwrap();
            let undone = state.results.insert(alice.id, &analysis).unwrap();
            state.results.remove(undone.id).unwrap();
            state.users.record_outcome(alice.id, ReputationChange::Merit(7)).unwrap();

            state.users.delete(bob.id).unwrap();
            assert_eq!(kept.id, 1);
            (alice.id, bob.id)
        };

        let state = AppState::new(config, Wal::new(wal_path.clone()).unwrap()).unwrap();
        let operations = state.wal.replay().unwrap();
        apply_wal_operations(&state, &operations).unwrap();

        let alice = state.users.get_by_email("alice@x.com").unwrap();
        assert_eq!(alice.id, alice_id);
        assert_eq!(alice.merit, 7);
        assert!(state.users.get_by_id(bob_id).is_none());
        assert!(state.users.authenticate("alice@x.com", "pw1").await.unwrap());

        assert_eq!(state.images.len(), 1);
        assert_eq!(state.results.list_by_user(alice_id).len(), 1);

        // Ids continue after the replayed maximum
        let carol = state.users.create("carol@x.com", "pw3", Role::User).await.unwrap();
        assert_eq!(carol.id, 3);
    }
}
