//! Dashboard data views: pagination, debounced search, and polling.
//!
//! None of this touches the network. The CLI's watch loop owns the threads
//! and the channel; these types decide what to fetch and which results count.

use std::time::{Duration, Instant};

use serde_json::Value;

use crate::model::{ListQuery, ReportPage};

// ── Pagination ──

/// One page of rows, ready to render.
#[derive(Debug, Clone, PartialEq)]
pub struct PageView {
    pub rows: Vec<Value>,
    pub page: u32,
    pub total: u64,
    pub total_pages: u32,
    pub has_prev: bool,
    pub has_next: bool,
}

/// Shape a backend page for display.
///
/// Some list endpoints ignore `limit` and return every row. When more rows
/// than the limit arrive, the requested page is cut out locally.
pub fn page_view(page: ReportPage, query: &ListQuery) -> PageView {
    let limit = query.limit.max(1);
    let current = query.page.max(1);
    let ReportPage { data, pagination } = page;

    let total = if pagination.total > 0 {
        pagination.total
    } else {
        data.len() as u64
    };
    let total_pages = if pagination.total_pages > 0 {
        pagination.total_pages
    } else {
        u32::try_from(total.div_ceil(u64::from(limit))).unwrap_or(u32::MAX).max(1)
    };

    let rows = if data.len() > limit as usize {
        let start = (current as usize - 1) * limit as usize;
        data.into_iter().skip(start).take(limit as usize).collect()
    } else {
        data
    };

    PageView {
        rows,
        page: current,
        total,
        total_pages,
        has_prev: current > 1,
        has_next: current < total_pages,
    }
}

// ── Debounce ──

/// Holds back a value until it has been stable for the delay.
///
/// Each push restarts the window; only the last value of a burst comes out.
#[derive(Debug)]
pub struct Debouncer<T> {
    delay: Duration,
    pending: Option<(T, Instant)>,
}

impl<T> Debouncer<T> {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
        }
    }

    pub fn push(&mut self, value: T, now: Instant) {
        self.pending = Some((value, now + self.delay));
    }

    /// The pending value, once its window has passed.
    pub fn ready(&mut self, now: Instant) -> Option<T> {
        match &self.pending {
            Some((_, due)) if now >= *due => self.pending.take().map(|(v, _)| v),
            _ => None,
        }
    }

    /// When the pending value becomes ready.
    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|(_, due)| *due)
    }
}

// ── Polling ──

/// Proof of which parameter set a fetch was issued for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket {
    generation: u64,
}

/// Schedules fetches for the current parameters and rejects stale results.
///
/// Every change of parameters starts a new generation. A result is only
/// accepted with a ticket from the current generation, so a slow response
/// for old parameters can never overwrite newer state.
#[derive(Debug)]
pub struct Poller<P> {
    params: P,
    generation: u64,
    interval: Duration,
    next_due: Instant,
}

impl<P: Clone + PartialEq> Poller<P> {
    /// A poller whose first fetch is due immediately.
    pub fn new(params: P, interval: Duration, now: Instant) -> Self {
        Self {
            params,
            generation: 0,
            interval,
            next_due: now,
        }
    }

    pub fn params(&self) -> &P {
        &self.params
    }

    /// Switch parameters. A change starts a new generation and makes a fetch
    /// due right away. Returns whether anything changed.
    pub fn update(&mut self, params: P, now: Instant) -> bool {
        if params == self.params {
            return false;
        }
        self.params = params;
        self.generation += 1;
        self.next_due = now;
        true
    }

    /// Whether a fetch is due.
    pub fn due(&self, now: Instant) -> bool {
        now >= self.next_due
    }

    pub fn next_due(&self) -> Instant {
        self.next_due
    }

    /// Make a fetch due now without changing parameters.
    pub fn refresh(&mut self, now: Instant) {
        self.next_due = now;
    }

    /// Start a fetch for the current parameters; the next is due one interval later.
    pub fn issue(&mut self, now: Instant) -> (Ticket, P) {
        self.next_due = now + self.interval;
        let ticket = Ticket {
            generation: self.generation,
        };
        (ticket, self.params.clone())
    }

    pub fn is_current(&self, ticket: Ticket) -> bool {
        ticket.generation == self.generation
    }

    /// Pass a result through if its ticket is current.
    pub fn accept<T>(&self, ticket: Ticket, result: T) -> Option<T> {
        self.is_current(ticket).then_some(result)
    }

    /// Invalidate everything outstanding.
    pub fn stop(&mut self) {
        self.generation += 1;
    }
}

// ── Watch ──

/// A report list kept on screen: polling plus debounced search over one query.
///
/// Holds no channel or thread. The caller asks [`ListWatch::tick`] what to
/// fetch, runs the fetch wherever it likes, and hands the result back.
#[derive(Debug)]
pub struct ListWatch {
    poller: Poller<ListQuery>,
    search: Debouncer<String>,
    total_pages: u32,
}

impl ListWatch {
    pub fn new(query: ListQuery, interval: Duration, debounce: Duration, now: Instant) -> Self {
        Self {
            poller: Poller::new(query, interval, now),
            search: Debouncer::new(debounce),
            total_pages: 1,
        }
    }

    pub fn query(&self) -> &ListQuery {
        self.poller.params()
    }

    /// Applies a settled search, then returns the fetch to start if one is due.
    pub fn tick(&mut self, now: Instant) -> Option<(Ticket, ListQuery)> {
        if let Some(text) = self.search.ready(now) {
            let query = ListQuery {
                page: 1,
                search: (!text.is_empty()).then_some(text),
                ..self.query().clone()
            };
            self.poller.update(query, now);
        }
        self.poller.due(now).then(|| self.poller.issue(now))
    }

    /// The next moment [`Self::tick`] may have work.
    pub fn wake_at(&self) -> Instant {
        let due = self.poller.next_due();
        self.search.deadline().map_or(due, |d| d.min(due))
    }

    /// Queue a search. An empty string clears it once the input settles.
    pub fn search(&mut self, text: String, now: Instant) {
        self.search.push(text, now);
    }

    /// Move one page forward or back. Returns false at either end.
    pub fn turn(&mut self, forward: bool, now: Instant) -> bool {
        let current = self.query().clone();
        let page = if forward {
            (current.page < self.total_pages).then(|| current.page + 1)
        } else {
            (current.page > 1).then(|| current.page - 1)
        };
        match page {
            Some(page) => self.poller.update(ListQuery { page, ..current }, now),
            None => false,
        }
    }

    pub fn refresh(&mut self, now: Instant) {
        self.poller.refresh(now);
    }

    /// Take a finished fetch. Stale results come back as `None`.
    pub fn accept<E>(
        &mut self,
        ticket: Ticket,
        query: &ListQuery,
        result: Result<ReportPage, E>,
    ) -> Option<Result<PageView, E>> {
        let result = self.poller.accept(ticket, result)?;
        Some(result.map(|page| {
            let view = page_view(page, query);
            self.total_pages = view.total_pages;
            view
        }))
    }

    /// Invalidate every outstanding fetch.
    pub fn stop(&mut self) {
        self.poller.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    use crate::model::Pagination;

    fn rows(n: u64) -> Vec<Value> {
        (1..=n).map(|id| json!({ "id": id })).collect()
    }

    fn query(page: u32) -> ListQuery {
        ListQuery {
            page,
            limit: 10,
            search: None,
        }
    }

    #[test]
    fn oversized_response_is_sliced_locally() {
        let page = ReportPage {
            data: rows(12),
            pagination: Pagination::default(),
        };

        let view = page_view(page, &query(2));
        assert_eq!(view.rows, vec![json!({"id": 11}), json!({"id": 12})]);
        assert_eq!(view.total_pages, 2);
        assert!(view.has_prev);
        assert!(!view.has_next);
    }

    #[test]
    fn server_pagination_is_trusted() {
        let page = ReportPage {
            data: rows(10),
            pagination: Pagination {
                total: 35,
                limit: 10,
                total_pages: 4,
                page: Some(1),
            },
        };

        let view = page_view(page, &query(1));
        assert_eq!(view.rows.len(), 10);
        assert_eq!(view.total, 35);
        assert!(!view.has_prev);
        assert!(view.has_next);
    }

    #[test]
    fn empty_list_is_one_page() {
        let view = page_view(ReportPage::default(), &query(1));
        assert!(view.rows.is_empty());
        assert_eq!(view.total_pages, 1);
        assert!(!view.has_next);
    }

    #[test]
    fn burst_of_keystrokes_yields_last_value() {
        let start = Instant::now();
        let mut debouncer = Debouncer::new(Duration::from_millis(500));

        debouncer.push("abc", start);
        debouncer.push("abcd", start + Duration::from_millis(120));

        assert_eq!(debouncer.ready(start + Duration::from_millis(500)), None);
        assert_eq!(
            debouncer.deadline(),
            Some(start + Duration::from_millis(620))
        );
        assert_eq!(
            debouncer.ready(start + Duration::from_millis(620)),
            Some("abcd")
        );
        assert_eq!(debouncer.ready(start + Duration::from_secs(5)), None);
    }

    #[test]
    fn stale_results_are_dropped() {
        let start = Instant::now();
        let mut poller = Poller::new("dumas", Duration::from_secs(30), start);
        assert!(poller.due(start));

        let (old, params) = poller.issue(start);
        assert_eq!(params, "dumas");
        assert!(!poller.due(start + Duration::from_secs(1)));

        assert!(poller.update("saran", start + Duration::from_secs(1)));
        let (new, params) = poller.issue(start + Duration::from_secs(1));
        assert_eq!(params, "saran");

        assert_eq!(poller.accept(old, "dumas rows"), None);
        assert_eq!(poller.accept(new, "saran rows"), Some("saran rows"));
    }

    #[test]
    fn same_params_keep_generation() {
        let start = Instant::now();
        let mut poller = Poller::new(1, Duration::from_secs(30), start);
        let (ticket, _) = poller.issue(start);

        assert!(!poller.update(1, start));
        assert!(poller.is_current(ticket));
        assert!(poller.due(start + Duration::from_secs(30)));

        poller.refresh(start + Duration::from_secs(2));
        assert!(poller.due(start + Duration::from_secs(2)));
        assert!(poller.is_current(ticket));

        poller.stop();
        assert!(!poller.is_current(ticket));
    }

    fn watch(start: Instant) -> ListWatch {
        ListWatch::new(
            query(1),
            Duration::from_secs(30),
            Duration::from_millis(500),
            start,
        )
    }

    #[test]
    fn watch_search_burst_issues_one_fetch() {
        let start = Instant::now();
        let mut watch = watch(start);
        let at = |ms| start + Duration::from_millis(ms);

        let (first, initial) = watch.tick(start).unwrap();
        assert_eq!(initial.search, None);

        watch.search("abc".into(), at(1_000));
        watch.search("abcd".into(), at(1_120));

        let mut fetches = Vec::new();
        for ms in (1_000..=3_000).step_by(10) {
            fetches.extend(watch.tick(at(ms)));
        }

        assert_eq!(fetches.len(), 1);
        let (ticket, sent) = &fetches[0];
        assert_eq!(sent.search.as_deref(), Some("abcd"));
        assert_eq!(sent.page, 1);

        // The pre-search fetch answers late and is ignored.
        let late = ReportPage {
            data: rows(3),
            pagination: Pagination::default(),
        };
        assert!(watch.accept::<()>(first, &initial, Ok(late)).is_none());
        let fresh = ReportPage {
            data: rows(1),
            pagination: Pagination::default(),
        };
        let view = watch.accept::<()>(*ticket, sent, Ok(fresh)).unwrap().unwrap();
        assert_eq!(view.rows.len(), 1);
    }

    #[test]
    fn watch_wakes_for_the_earlier_deadline() {
        let start = Instant::now();
        let mut watch = watch(start);
        watch.tick(start);
        assert_eq!(watch.wake_at(), start + Duration::from_secs(30));

        watch.search("jalan".into(), start + Duration::from_secs(1));
        assert_eq!(watch.wake_at(), start + Duration::from_millis(1_500));
    }

    #[test]
    fn watch_paging_stops_at_known_bounds() {
        let start = Instant::now();
        let mut watch = watch(start);
        let (ticket, sent) = watch.tick(start).unwrap();

        assert!(!watch.turn(true, start), "only one page known before any result");
        assert!(!watch.turn(false, start));

        let page = ReportPage {
            data: rows(12),
            pagination: Pagination::default(),
        };
        watch.accept::<()>(ticket, &sent, Ok(page)).unwrap().unwrap();

        assert!(watch.turn(true, start));
        assert_eq!(watch.query().page, 2);
        let (_, next) = watch.tick(start).unwrap();
        assert_eq!(next.page, 2);
        assert!(!watch.turn(true, start));
    }
}
