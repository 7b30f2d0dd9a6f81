use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Состояние диалога пользователя в процессе оформления заявки.
///
/// Строго линейный поток: выбор валюты → сумма → кошелек → подтверждение
/// → чек. Данные, накопленные по пути, живут в самом состоянии и
/// сбрасываются вместе с ним.
#[derive(Debug, Clone, PartialEq)]
pub enum UserState {
    /// Ожидание выбора криптовалюты
    WaitingCrypto,
    /// Ожидание ввода суммы в RUB
    WaitingAmount {
        /// Код выбранной валюты (BTC, ETH, ...)
        crypto: String,
    },
    /// Ожидание адреса кошелька
    WaitingWallet {
        crypto: String,
        amount_rub: f64,
        crypto_amount: f64,
    },
    /// Ожидание подтверждения заявки
    Confirming {
        crypto: String,
        amount_rub: f64,
        crypto_amount: f64,
        wallet_address: String,
        /// Комментарий к платежу для ручной сверки
        comment: String,
    },
    /// Заявка создана, ожидание скриншота чека
    WaitingReceipt {
        /// ID созданной заявки
        order_id: i64,
    },
    /// Админ вводит название новой реферальной ссылки
    WaitingReferralName,
}

/// Хранилище состояний диалогов, ключ - Telegram ID пользователя.
///
/// Отсутствие записи означает состояние idle. Хранилище передается в
/// обработчики через зависимости, поэтому его можно заменить на
/// персистентное без изменения логики переходов.
#[derive(Clone)]
pub struct SessionStore {
    states: Arc<Mutex<HashMap<i64, UserState>>>,
}

impl SessionStore {
    /// Создает пустое хранилище состояний.
    pub fn new() -> Self {
        Self {
            states: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Возвращает текущее состояние пользователя (None = idle).
    pub async fn get(&self, user_id: i64) -> Option<UserState> {
        let states = self.states.lock().await;
        states.get(&user_id).cloned()
    }

    /// Устанавливает состояние пользователя, заменяя предыдущее.
    pub async fn set(&self, user_id: i64, state: UserState) {
        let mut states = self.states.lock().await;
        states.insert(user_id, state);
    }

    /// Сбрасывает состояние пользователя в idle.
    pub async fn clear(&self, user_id: i64) {
        let mut states = self.states.lock().await;
        states.remove(&user_id);
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn starts_idle() {
        let store = SessionStore::new();
        assert_eq!(store.get(1).await, None);
    }

    #[tokio::test]
    async fn set_and_clear_roundtrip() {
        let store = SessionStore::new();
        store.set(1, UserState::WaitingCrypto).await;
        assert_eq!(store.get(1).await, Some(UserState::WaitingCrypto));

        store.clear(1).await;
        assert_eq!(store.get(1).await, None);
    }

    #[tokio::test]
    async fn states_are_keyed_per_user() {
        let store = SessionStore::new();
        store.set(1, UserState::WaitingCrypto).await;
        store
            .set(
                2,
                UserState::WaitingAmount {
                    crypto: "BTC".to_string(),
                },
            )
            .await;

        assert_eq!(store.get(1).await, Some(UserState::WaitingCrypto));
        assert_eq!(
            store.get(2).await,
            Some(UserState::WaitingAmount {
                crypto: "BTC".to_string()
            })
        );

        store.clear(1).await;
        assert_eq!(store.get(1).await, None);
        assert!(store.get(2).await.is_some());
    }

    #[tokio::test]
    async fn set_replaces_previous_state() {
        let store = SessionStore::new();
        store.set(1, UserState::WaitingCrypto).await;
        store.set(1, UserState::WaitingReferralName).await;
        assert_eq!(store.get(1).await, Some(UserState::WaitingReferralName));
    }
}
