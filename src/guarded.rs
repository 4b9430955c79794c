use std::{
    fmt,
    sync::{Mutex, MutexGuard, PoisonError},
};


/// Значение под мьютексом с доступом только через замыкание.
///
/// Блокировка не реентерабельна: вызов `apply`/`get` на том же экземпляре
/// изнутри замыкания `apply` приводит к deadlock.
///
/// Паника внутри `apply` снимает блокировку; следующие вызовы видят
/// значение в том состоянии, в котором его оставило замыкание.
pub struct Guarded<T> {
    value: Mutex<T>,
}

impl<T> Guarded<T> {
    pub fn new(value: T) -> Self {
        Self {
            value: Mutex::new(value),
        }
    }

    #[inline]
    fn lock(&self) -> MutexGuard<'_, T> {
        self.value.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Вызывает `f` над защищённым значением под блокировкой
    #[inline]
    pub fn apply<R, F>(&self, f: F) -> R
    where
        F: FnOnce(&mut T) -> R,
    {
        let mut guard = self.lock();
        f(&mut *guard)
    }

    /// Копия текущего значения. Может устареть сразу после возврата
    #[inline]
    pub fn get(&self) -> T
    where
        T: Clone,
    {
        self.lock().clone()
    }

    pub fn take(&self) -> T
    where
        T: Default,
    {
        std::mem::take(&mut *self.lock())
    }

    pub fn into_inner(self) -> T {
        self.value.into_inner().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T: Default> Default for Guarded<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: fmt::Debug> fmt::Debug for Guarded<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Guarded").field("value", &*self.lock()).finish()
    }
}
