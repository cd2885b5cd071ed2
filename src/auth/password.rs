use bcrypt::{hash, verify, DEFAULT_COST};
use tokio::task::spawn_blocking;
use crate::error::AuthError;

// bcrypt is CPU-bound; keep it off the async workers.
pub async fn hash_password(password: &str) -> Result<String, AuthError> {
    let password = password.to_string();
    Ok(spawn_blocking(move || hash(password, DEFAULT_COST)).await??)
}

pub async fn verify_password(password: &str, hash: &str) -> Result<bool, AuthError> {
    let password = password.to_string();
    let hash = hash.to_string();
    Ok(spawn_blocking(move || verify(password, &hash)).await??)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn hash_round_trip() {
        let hashed = hash_password("hunter2").await.unwrap();
        assert_ne!(hashed, "hunter2");
        assert!(verify_password("hunter2", &hashed).await.unwrap());
        assert!(!verify_password("hunter3", &hashed).await.unwrap());
    }

    #[tokio::test]
    async fn hashes_are_salted() {
        assert_ne!(
            hash_password("same").await.unwrap(),
            hash_password("same").await.unwrap()
        );
    }

    #[tokio::test(flavor = "current_thread")]
    async fn hashing_does_not_stall_the_runtime() {
        let ticker = tokio::spawn(async {
            let mut ticks = 0u32;
            loop {
                tokio::time::sleep(std::time::Duration::from_millis(1)).await;
                ticks += 1;
                if ticks == 5 {
                    return ticks;
                }
            }
        });

        let hashed = hash_password("hunter2").await.unwrap();
        // The single runtime thread kept running the ticker while bcrypt worked.
        assert!(ticker.is_finished());
        assert!(verify_password("hunter2", &hashed).await.unwrap());
    }
}
