/// A single price level: a FIFO queue of resting orders at one price.
///
/// The queue is a doubly-linked list threaded through the `prev`/`next`
/// slot handles of the orders themselves, so linking and unlinking
/// touch no memory beyond the affected nodes. The level owns the
/// linkage; the order records live in the pool.

use crate::pool::{OrderPool, NIL};
use crate::types::{Price, Quantity};

#[derive(Debug, Clone, Copy)]
pub struct PriceLevel {
    price: Price,
    head: u32,
    tail: u32,
    total_quantity: Quantity,
    order_count: u32,
}

impl PriceLevel {
    pub fn new(price: Price) -> Self {
        PriceLevel {
            price,
            head: NIL,
            tail: NIL,
            total_quantity: 0,
            order_count: 0,
        }
    }

    /// Append at the tail. Later arrivals queue behind earlier ones,
    /// which is exactly price-time priority at this price.
    pub fn push_back(&mut self, pool: &mut OrderPool, slot: u32) {
        let old_tail = self.tail;
        {
            let order = pool.get_mut(slot);
            order.prev = old_tail;
            order.next = NIL;
        }
        if old_tail != NIL {
            pool.get_mut(old_tail).next = slot;
        } else {
            self.head = slot;
        }
        self.tail = slot;

        self.total_quantity += pool.get(slot).quantity;
        self.order_count += 1;
    }

    /// Unlink an order from the queue and clear its links. The slot
    /// stays alive in the pool; releasing it is the book's decision.
    pub fn unlink(&mut self, pool: &mut OrderPool, slot: u32) {
        let (prev, next, quantity) = {
            let order = pool.get(slot);
            (order.prev, order.next, order.quantity)
        };

        self.total_quantity -= quantity;
        self.order_count -= 1;

        if prev != NIL {
            pool.get_mut(prev).next = next;
        } else {
            self.head = next;
        }
        if next != NIL {
            pool.get_mut(next).prev = prev;
        } else {
            self.tail = prev;
        }

        let order = pool.get_mut(slot);
        order.prev = NIL;
        order.next = NIL;
    }

    /// Shrink an order by `delta` shares; unlinks it once it reaches
    /// zero. `delta` must not exceed the order's remaining quantity.
    pub fn reduce(&mut self, pool: &mut OrderPool, slot: u32, delta: Quantity) {
        {
            let order = pool.get_mut(slot);
            debug_assert!(order.quantity >= delta);
            order.quantity -= delta;
        }
        self.total_quantity -= delta;

        if pool.get(slot).quantity == 0 {
            self.unlink(pool, slot);
        }
    }

    #[inline]
    pub fn price(&self) -> Price {
        self.price
    }

    #[inline]
    pub fn total_quantity(&self) -> Quantity {
        self.total_quantity
    }

    #[inline]
    pub fn order_count(&self) -> usize {
        self.order_count as usize
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.order_count == 0
    }

    #[inline]
    pub fn front(&self) -> Option<u32> {
        (self.head != NIL).then_some(self.head)
    }

    #[inline]
    pub fn back(&self) -> Option<u32> {
        (self.tail != NIL).then_some(self.tail)
    }
}
