//! Blocking hand-off of a problem to an interactive solver.
//!
//! The requester submits a problem, then polls a shared status slot at a
//! bounded interval until the solver reports a terminal status. The
//! session can be abandoned from any thread through a [`CancelHandle`].

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use crate::error::OracleError;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChallengeStatus {
    Pending,
    Solving,
    Success,
    Failed,
    Cancelled,
}

impl ChallengeStatus {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            ChallengeStatus::Success | ChallengeStatus::Failed | ChallengeStatus::Cancelled
        )
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WaitPolicy {
    pub poll_interval: Duration,
    /// `None` waits until the solver or a cancel handle ends the session.
    pub timeout: Option<Duration>,
}

impl WaitPolicy {
    pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

impl Default for WaitPolicy {
    fn default() -> Self {
        Self {
            poll_interval: Self::DEFAULT_POLL_INTERVAL,
            timeout: None,
        }
    }
}

/// Abandons a challenge session. Cheap to clone and `Send`.
#[derive(Clone, Debug, Default)]
pub struct CancelHandle {
    cancelled: Arc<AtomicBool>,
}

impl CancelHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

struct Slot<T> {
    status: ChallengeStatus,
    solution: Option<T>,
    responder_alive: bool,
}

struct Shared<T> {
    slot: Mutex<Slot<T>>,
    cancel: CancelHandle,
}

/// Requester side of a challenge.
pub struct ChallengeTicket<T> {
    shared: Arc<Shared<T>>,
}

/// Solver side of a challenge. Dropping it unanswered interrupts the wait.
pub struct ChallengeResponder<T> {
    shared: Arc<Shared<T>>,
    answered: bool,
}

pub fn open_challenge<T>() -> (ChallengeTicket<T>, ChallengeResponder<T>) {
    open_challenge_with(CancelHandle::new())
}

/// Open a challenge that `cancel` can abandon.
pub fn open_challenge_with<T>(cancel: CancelHandle) -> (ChallengeTicket<T>, ChallengeResponder<T>) {
    let shared = Arc::new(Shared {
        slot: Mutex::new(Slot {
            status: ChallengeStatus::Pending,
            solution: None,
            responder_alive: true,
        }),
        cancel,
    });

    (
        ChallengeTicket { shared: Arc::clone(&shared) },
        ChallengeResponder { shared, answered: false },
    )
}

impl<T> ChallengeTicket<T> {
    pub fn cancel_handle(&self) -> CancelHandle {
        self.shared.cancel.clone()
    }

    pub fn status(&self) -> Result<ChallengeStatus, OracleError> {
        self.shared
            .slot
            .lock()
            .map(|slot| slot.status)
            .map_err(|_| OracleError::Interrupted("challenge status lock poisoned".to_string()))
    }

    /// Block until the challenge reaches a terminal status, the session is
    /// cancelled, or the policy's timeout elapses.
    pub fn wait(self, policy: &WaitPolicy) -> Result<T, OracleError> {
        let started = Instant::now();

        loop {
            if self.shared.cancel.is_cancelled() {
                log::warn!("challenge abandoned while waiting for a solution");
                self.mark_cancelled();
                return Err(OracleError::Cancelled);
            }

            if let Some(outcome) = self.poll()? {
                return outcome;
            }

            let mut nap = policy.poll_interval;
            if let Some(timeout) = policy.timeout {
                let elapsed = started.elapsed();
                if elapsed >= timeout {
                    log::warn!("challenge timed out after {:?}", elapsed);
                    self.mark_cancelled();
                    return Err(OracleError::TimedOut);
                }
                nap = nap.min(timeout - elapsed);
            }
            thread::sleep(nap);
        }
    }

    fn poll(&self) -> Result<Option<Result<T, OracleError>>, OracleError> {
        let mut slot = match self.shared.slot.lock() {
            Ok(slot) => slot,
            Err(_) => {
                log::error!("solver panicked while updating the challenge, abandoning wait");
                return Err(OracleError::Interrupted(
                    "challenge status lock poisoned".to_string(),
                ));
            }
        };

        let outcome = match slot.status {
            ChallengeStatus::Success => Some(slot.solution.take().ok_or_else(|| {
                OracleError::Interrupted("challenge solved without a solution".to_string())
            })),
            ChallengeStatus::Failed => Some(Err(OracleError::Failed)),
            ChallengeStatus::Cancelled => Some(Err(OracleError::Cancelled)),
            ChallengeStatus::Pending | ChallengeStatus::Solving => {
                if slot.responder_alive {
                    None
                } else {
                    log::error!("solver dropped the challenge without answering");
                    Some(Err(OracleError::Interrupted(
                        "solver dropped the challenge".to_string(),
                    )))
                }
            }
        };
        Ok(outcome)
    }

    fn mark_cancelled(&self) {
        if let Ok(mut slot) = self.shared.slot.lock() {
            if !slot.status.is_terminal() {
                slot.status = ChallengeStatus::Cancelled;
            }
        }
    }
}

impl<T> ChallengeResponder<T> {
    /// Solver has picked the problem up.
    pub fn start(&self) {
        self.set_status(ChallengeStatus::Solving);
    }

    pub fn is_cancelled(&self) -> bool {
        self.shared.cancel.is_cancelled()
            || matches!(self.status(), Some(ChallengeStatus::Cancelled))
    }

    pub fn status(&self) -> Option<ChallengeStatus> {
        self.shared.slot.lock().ok().map(|slot| slot.status)
    }

    /// Deliver the solution. Returns `false` if the requester already
    /// gave up on the challenge.
    pub fn submit(mut self, solution: T) -> bool {
        self.answered = true;
        let Ok(mut slot) = self.shared.slot.lock() else {
            return false;
        };
        if slot.status.is_terminal() || self.shared.cancel.is_cancelled() {
            return false;
        }
        slot.solution = Some(solution);
        slot.status = ChallengeStatus::Success;
        true
    }

    pub fn give_up(mut self) {
        self.answered = true;
        self.set_status(ChallengeStatus::Failed);
    }

    fn set_status(&self, status: ChallengeStatus) {
        if let Ok(mut slot) = self.shared.slot.lock() {
            if !slot.status.is_terminal() {
                slot.status = status;
            }
        }
    }
}

impl<T> Drop for ChallengeResponder<T> {
    fn drop(&mut self) {
        if self.answered {
            return;
        }
        if let Ok(mut slot) = self.shared.slot.lock() {
            slot.responder_alive = false;
        }
    }
}

/// Anything that can take a problem and eventually answer through a
/// responder, typically an interactive front end running on another thread.
pub trait ChallengeSolver<P, T> {
    fn accept(&mut self, problem: P, responder: ChallengeResponder<T>);
}

/// Hands problems to a human-in-the-loop solver and blocks for the answer.
pub struct UserOracle<S> {
    solver: S,
    policy: WaitPolicy,
    session: CancelHandle,
}

impl<S> UserOracle<S> {
    pub fn new(solver: S, policy: WaitPolicy) -> Self {
        Self {
            solver,
            policy,
            session: CancelHandle::new(),
        }
    }

    /// Cancels the challenge in progress and every later one.
    pub fn session_cancel_handle(&self) -> CancelHandle {
        self.session.clone()
    }

    pub fn solver(&self) -> &S {
        &self.solver
    }

    pub fn solve_challenge<P, T>(&mut self, problem: P) -> Result<T, OracleError>
    where
        S: ChallengeSolver<P, T>,
    {
        if self.session.is_cancelled() {
            return Err(OracleError::Cancelled);
        }

        let (ticket, responder) = open_challenge_with(self.session.clone());
        self.solver.accept(problem, responder);
        ticket.wait(&self.policy)
    }
}
