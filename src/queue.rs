//! Блокирующая FIFO-очередь с однократной отменой.
//!
//! Построена на двух каналах crossbeam: канал элементов будит одного
//! ожидающего на каждый `push`, а канал отмены разрывается в `cancel()`
//! и тем самым будит всех ожидающих сразу.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Mutex, PoisonError,
};
use crossbeam::{
    channel::{self, Receiver, Sender, TryRecvError},
    select,
};


pub struct BlockingQueue<T> {
    items_tx: Sender<T>,
    items_rx: Receiver<T>,
    cancel_tx: Mutex<Option<Sender<()>>>,
    cancel_rx: Receiver<()>,
    cancelled: AtomicBool,
}

impl<T> BlockingQueue<T> {
    pub fn new() -> Self {
        let (items_tx, items_rx) = channel::unbounded();
        let (cancel_tx, cancel_rx) = channel::bounded(0);
        Self {
            items_tx,
            items_rx,
            cancel_tx: Mutex::new(Some(cancel_tx)),
            cancel_rx,
            cancelled: AtomicBool::new(false),
        }
    }

    /// Кладёт элемент в хвост и будит одного ожидающего.
    /// Принимается всегда, в том числе после `cancel()`
    #[inline]
    pub fn push(&self, item: T) {
        // items_rx живёт вместе с очередью, поэтому send не может вернуть ошибку
        let _ = self.items_tx.send(item);
    }

    /// Забирает голову очереди.
    ///
    /// Пока очередь не пуста, элементы отдаются независимо от отмены.
    /// На пустой очереди при `wait == true` блокируется до `push` или
    /// `cancel()`; после отмены пустая очередь сразу возвращает `None`.
    pub fn pop(&self, wait: bool) -> Option<T> {
        match self.items_rx.try_recv() {
            Ok(item) => return Some(item),
            Err(TryRecvError::Disconnected) => return None,
            Err(TryRecvError::Empty) => {}
        }

        if !wait {
            return None;
        }

        if self.is_cancelled() {
            // push мог успеть между try_recv и проверкой флага
            return self.items_rx.try_recv().ok();
        }

        select! {
            recv(self.items_rx) -> item => item.ok(),
            // канал отмены разорван: дочитываем то, что успело прийти
            recv(self.cancel_rx) -> _ => self.items_rx.try_recv().ok(),
        }
    }

    /// Отпускает всех ожидающих и запрещает дальнейшее ожидание
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
        let sender = self
            .cancel_tx
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        drop(sender);
    }

    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items_rx.is_empty()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.items_rx.len()
    }
}

impl<T> Default for BlockingQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}
