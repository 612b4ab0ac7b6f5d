//! LMDB environment setup.

use std::path::Path;

use heed::types::{Bytes, Str};
use heed::{Database, Env, EnvOpenOptions};

use quizpay_crypto::CipherKey;

use crate::{LmdbError, LmdbRewardStore};

const REWARDS_DB: &str = "rewards";

/// Wraps the LMDB environment and its database handles.
pub struct LmdbEnvironment {
    env: Env,
    rewards_db: Database<Str, Bytes>,
}

impl LmdbEnvironment {
    /// Open or create an LMDB environment at the given path.
    pub fn open(path: &Path, max_dbs: u32, map_size: usize) -> Result<Self, LmdbError> {
        std::fs::create_dir_all(path)?;
        // SAFETY: the environment is opened once per process and the
        // directory is not shared with another process mapping it differently.
        let env = unsafe {
            EnvOpenOptions::new()
                .map_size(map_size)
                .max_dbs(max_dbs)
                .open(path)?
        };

        let mut wtxn = env.write_txn()?;
        let rewards_db = env.create_database(&mut wtxn, Some(REWARDS_DB))?;
        wtxn.commit()?;

        tracing::debug!(path = %path.display(), "opened LMDB environment");
        Ok(Self { env, rewards_db })
    }

    /// Reward store over this environment, decrypting payloads with `key`.
    pub fn reward_store(&self, key: CipherKey) -> LmdbRewardStore {
        LmdbRewardStore {
            env: self.env.clone(),
            rewards_db: self.rewards_db,
            key,
        }
    }

    pub fn rewards_db(&self) -> Database<Str, Bytes> {
        self.rewards_db
    }

    pub fn env(&self) -> &Env {
        &self.env
    }
}
