/// Order record pool.
///
/// Orders are pooled in a slab addressed by `u32` slot handles and
/// recycled through a free list threaded through the `next` link of
/// unused slots. The slab grows by fixed-size blocks and never shrinks;
/// because handles are indices rather than addresses, growth never
/// invalidates a handle held by a book. Single-threaded by design.

use crate::types::{OrderId, Price, Quantity, Side, StockLocate, Timestamp};

/// Null slot handle, used for absent prev/next links and the free list
/// terminator.
pub const NIL: u32 = u32::MAX;

/// Slots added per growth step.
pub const BLOCK_SIZE: usize = 4096;

/// A resting order. Lives in the pool; linked into exactly one price
/// level's FIFO while resident in a book.
#[derive(Debug, Clone, Copy)]
pub struct Order {
    pub order_id: OrderId,
    pub price: Price,
    pub quantity: Quantity,
    pub original_qty: Quantity,
    pub stock_locate: StockLocate,
    pub side: Side,
    pub timestamp: Timestamp,
    pub next: u32,
    pub prev: u32,
}

impl Order {
    fn vacant() -> Self {
        Order {
            order_id: 0,
            price: 0,
            quantity: 0,
            original_qty: 0,
            stock_locate: 0,
            side: Side::Buy,
            timestamp: 0,
            next: NIL,
            prev: NIL,
        }
    }

    pub fn reset(&mut self) {
        *self = Order::vacant();
    }
}

pub struct OrderPool {
    slots: Vec<Order>,
    free_head: u32,
    outstanding: usize,
}

impl OrderPool {
    pub fn new() -> Self {
        let mut pool = OrderPool {
            slots: Vec::new(),
            free_head: NIL,
            outstanding: 0,
        };
        pool.grow();
        pool
    }

    fn grow(&mut self) {
        let start = self.slots.len();
        debug_assert!(start + BLOCK_SIZE < NIL as usize);
        self.slots.resize(start + BLOCK_SIZE, Order::vacant());
        // Thread the new block onto the free list, newest first.
        for i in (start..start + BLOCK_SIZE).rev() {
            self.slots[i].next = self.free_head;
            self.free_head = i as u32;
        }
    }

    /// Hand out an unused slot, growing by one block when exhausted.
    #[inline]
    pub fn acquire(&mut self) -> u32 {
        if self.free_head == NIL {
            self.grow();
        }
        let slot = self.free_head;
        self.free_head = self.slots[slot as usize].next;
        self.slots[slot as usize].next = NIL;
        self.outstanding += 1;
        slot
    }

    /// Return a slot to the free list. The slot must have come from
    /// `acquire` and must not be linked into a level.
    #[inline]
    pub fn release(&mut self, slot: u32) {
        debug_assert!((slot as usize) < self.slots.len());
        debug_assert!(self.outstanding > 0);
        let order = &mut self.slots[slot as usize];
        order.reset();
        order.next = self.free_head;
        self.free_head = slot;
        self.outstanding -= 1;
    }

    #[inline]
    pub fn get(&self, slot: u32) -> &Order {
        &self.slots[slot as usize]
    }

    #[inline]
    pub fn get_mut(&mut self, slot: u32) -> &mut Order {
        &mut self.slots[slot as usize]
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn outstanding(&self) -> usize {
        self.outstanding
    }

    pub fn available(&self) -> usize {
        self.slots.len() - self.outstanding
    }

    /// Write-touch every slot to fault pages in before ingest.
    pub fn warm(&mut self) {
        for order in &mut self.slots {
            let ts = std::ptr::addr_of_mut!(order.timestamp);
            // Volatile so the pass is not optimized away.
            unsafe { std::ptr::write_volatile(ts, 0) };
        }
    }
}

impl Default for OrderPool {
    fn default() -> Self {
        Self::new()
    }
}
