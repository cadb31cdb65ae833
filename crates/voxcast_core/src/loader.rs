//! Last-writer-wins guard for asynchronous loads
//!
//! Every load is issued a [`LoadTicket`]. When its result comes back it is
//! applied only if no newer load has been started in the meantime, so a slow
//! early load can never overwrite a fast later one.

/// Identifies one load request
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LoadTicket(u64);

impl LoadTicket {
    /// Sequence number, increasing with every request
    pub fn generation(self) -> u64 {
        self.0
    }
}

/// Issues tickets and decides which results may be applied
#[derive(Debug, Default)]
pub struct LoadGeneration {
    latest: u64,
    applied: u64,
}

impl LoadGeneration {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new load, superseding all in-flight ones
    pub fn begin(&mut self) -> LoadTicket {
        self.latest += 1;
        LoadTicket(self.latest)
    }

    /// Whether `ticket` belongs to the most recent request
    pub fn is_current(&self, ticket: LoadTicket) -> bool {
        ticket.0 == self.latest
    }

    /// Claim the right to apply a finished result
    ///
    /// Returns `false` for stale tickets and for a ticket that was already
    /// accepted.
    pub fn accept(&mut self, ticket: LoadTicket) -> bool {
        if self.is_current(ticket) && ticket.0 > self.applied {
            self.applied = ticket.0;
            true
        } else {
            false
        }
    }

    /// Whether the most recent request has not been applied yet
    pub fn in_flight(&self) -> bool {
        self.latest > self.applied
    }

    /// Generation of the last applied result (0 if none)
    pub fn applied(&self) -> u64 {
        self.applied
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_load() {
        let mut loads = LoadGeneration::new();
        let ticket = loads.begin();
        assert!(loads.in_flight());
        assert!(loads.accept(ticket));
        assert!(!loads.in_flight());
        assert_eq!(loads.applied(), ticket.generation());
    }

    #[test]
    fn test_stale_result_rejected() {
        let mut loads = LoadGeneration::new();
        let first = loads.begin();
        let second = loads.begin();

        // The newer load finishes first
        assert!(loads.accept(second));
        // The older one resolves later and must not overwrite it
        assert!(!loads.accept(first));
        assert_eq!(loads.applied(), second.generation());
    }

    #[test]
    fn test_superseded_before_completion() {
        let mut loads = LoadGeneration::new();
        let first = loads.begin();
        let _second = loads.begin();
        assert!(!loads.is_current(first));
        assert!(!loads.accept(first));
        assert!(loads.in_flight());
    }

    #[test]
    fn test_ticket_accepted_once() {
        let mut loads = LoadGeneration::new();
        let ticket = loads.begin();
        assert!(loads.accept(ticket));
        assert!(!loads.accept(ticket));
    }

    #[test]
    fn test_tickets_are_ordered() {
        let mut loads = LoadGeneration::new();
        let a = loads.begin();
        let b = loads.begin();
        assert!(a < b);
    }
}
