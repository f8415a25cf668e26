//! Chat session: the dialog state machine and its activity monitor.
//!
//! A session owns its message log, dialog flags and a virtual-time
//! scheduler. Every `send`, `note_activity` and fired task is one atomic
//! transition on `&mut self`. Dropping the session drops every pending
//! task with it.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::classify::{
    classify, confirms_correction, has_own_provider, is_affirmative_follow_up,
};
use super::correction::{correction_message, find_correction};
use super::responses;
use super::scheduler::{Scheduler, TaskId};
use super::types::{
    BotReply, DialogFlags, Gate, Message, PendingCorrection, SendOutcome,
};
use crate::config::ChatTimings;

/// Delayed work a session can schedule for itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduledTask {
    DoctorPrompt,
    DoctorWatchdog,
    FollowUpOffer,
    CheckIn,
    SessionEnd,
}

#[derive(Debug, Default)]
struct Timers {
    doctor_prompt: Option<TaskId>,
    doctor_watchdog: Option<TaskId>,
    follow_up: Option<TaskId>,
    check_in: Option<TaskId>,
    session_end: Option<TaskId>,
}

/// Serializable view of a session for transport.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub id: Uuid,
    pub active: bool,
    pub gate: Gate,
    pub message_count: u32,
    pub elapsed_ms: u64,
    /// Session clock at the last keystroke or accepted message.
    pub last_activity_ms: u64,
    /// Session clock at which the next timer fires. Clients poll then.
    pub next_timer_ms: Option<u64>,
    pub messages: Vec<Message>,
}

#[derive(Debug)]
pub struct ChatSession {
    id: Uuid,
    timings: ChatTimings,
    first_name: Option<String>,
    messages: Vec<Message>,
    flags: DialogFlags,
    message_count: u32,
    last_activity: Duration,
    check_in_sent: bool,
    session_active: bool,
    scheduler: Scheduler<ScheduledTask>,
    timers: Timers,
}

impl ChatSession {
    /// Open the chat surface: greet the user and arm the inactivity timers.
    pub fn open(timings: ChatTimings, first_name: Option<String>) -> Self {
        let first_name = first_name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty());

        let mut session = Self {
            id: Uuid::new_v4(),
            timings,
            first_name,
            messages: Vec::new(),
            flags: DialogFlags::default(),
            message_count: 0,
            last_activity: Duration::ZERO,
            check_in_sent: false,
            session_active: true,
            scheduler: Scheduler::new(),
            timers: Timers::default(),
        };

        let welcome = responses::welcome(session.first_name.as_deref());
        session.push_bot(welcome, |_| {});
        session.rearm_inactivity();

        tracing::debug!(session = %session.id, "Chat session opened");
        session
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn flags(&self) -> &DialogFlags {
        &self.flags
    }

    pub fn gate(&self) -> Gate {
        self.flags.gate()
    }

    pub fn is_active(&self) -> bool {
        self.session_active
    }

    /// Number of user messages accepted so far.
    pub fn message_count(&self) -> u32 {
        self.message_count
    }

    /// Current position of the session clock.
    pub fn now(&self) -> Duration {
        self.scheduler.now()
    }

    pub fn pending_tasks(&self) -> usize {
        self.scheduler.pending()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            id: self.id,
            active: self.session_active,
            gate: self.gate(),
            message_count: self.message_count,
            elapsed_ms: millis(self.now()),
            last_activity_ms: millis(self.last_activity),
            next_timer_ms: self.scheduler.next_deadline().map(millis),
            messages: self.messages.clone(),
        }
    }

    /// Keystroke heartbeat: resets the inactivity timers without sending.
    pub fn note_activity(&mut self) {
        if self.session_active {
            self.rearm_inactivity();
        }
    }

    /// Handle one user message.
    pub fn send(&mut self, text: &str) -> SendOutcome {
        if !self.session_active {
            return SendOutcome::SessionEnded;
        }
        let text = text.trim();
        if text.is_empty() {
            return SendOutcome::Ignored;
        }

        self.rearm_inactivity();
        let user = Message::user(text, millis(self.now()));
        self.messages.push(user);
        self.message_count += 1;

        let gate = self.flags.gate();
        match gate {
            Gate::Correction => self.answer_correction(text),
            Gate::DoctorChoice => self.answer_doctor_choice(text),
            Gate::FollowUp => self.answer_follow_up(text),
            Gate::Open => self.answer_open(text, true),
        }

        tracing::debug!(
            session = %self.id,
            gate = ?gate,
            message_count = self.message_count,
            "Chat input handled"
        );
        SendOutcome::Accepted { gate }
    }

    /// Advance the session clock by `by`, firing every task that comes due.
    pub fn advance(&mut self, by: Duration) {
        let target = self.now() + by;
        self.advance_to(target);
    }

    /// Advance the session clock to `at` (no-op if `at` is in the past).
    pub fn advance_to(&mut self, at: Duration) {
        while let Some(task) = self.scheduler.pop_due(at) {
            self.fire(task);
        }
        self.scheduler.set_now(at);
    }

    /// Close the chat surface. Pending tasks are discarded with the session;
    /// the transcript is handed back.
    pub fn close(mut self) -> Vec<Message> {
        self.scheduler.clear();
        tracing::debug!(session = %self.id, messages = self.messages.len(), "Chat session closed");
        self.messages
    }

    // ── Input handling ──────────────────────────────────────

    fn answer_open(&mut self, text: &str, check_spelling: bool) {
        let lowered = text.to_lowercase();
        let category = classify(&lowered);

        // Triage is never held back by a spelling question.
        if check_spelling && !category.is_triage() {
            if let Some(correction) = find_correction(&lowered) {
                let question = correction_message(&correction);
                self.flags.pending_correction = Some(PendingCorrection {
                    original: correction.original,
                    corrected: correction.corrected,
                });
                self.push_bot(BotReply::plain(question), |m| {
                    m.awaiting_correction = true;
                    m.awaiting_response = true;
                });
                tracing::debug!(session = %self.id, "Spelling correction offered");
                return;
            }
        }

        tracing::debug!(session = %self.id, category = category.as_str(), "Chat input classified");
        let reply = responses::respond(category, self.first_name.as_deref());
        self.push_bot(reply, |_| {});

        if category.is_triage() {
            self.schedule_doctor_prompt();
        } else {
            self.maybe_schedule_follow_up();
        }
    }

    fn answer_correction(&mut self, text: &str) {
        let Some(pending) = self.flags.pending_correction.take() else {
            return self.answer_open(text, true);
        };
        if confirms_correction(text) {
            self.answer_open(&pending.corrected, false);
        } else {
            self.push_bot(responses::spelling_apology(), |_| {});
        }
    }

    fn answer_doctor_choice(&mut self, text: &str) {
        self.flags.awaiting_doctor_choice = false;
        if let Some(id) = self.timers.doctor_watchdog.take() {
            self.scheduler.cancel(id);
        }
        let reply = if has_own_provider(text) {
            responses::own_provider()
        } else {
            responses::find_provider()
        };
        self.push_bot(reply, |_| {});
    }

    fn answer_follow_up(&mut self, text: &str) {
        self.flags.follow_up_offered = false;
        let reply = if is_affirmative_follow_up(text) {
            responses::follow_up_accepted()
        } else {
            responses::follow_up_declined()
        };
        self.push_bot(reply, |_| {});
    }

    // ── Scheduling ──────────────────────────────────────────

    fn schedule_doctor_prompt(&mut self) {
        if self.flags.awaiting_doctor_choice || self.timers.doctor_prompt.is_some() {
            return;
        }
        // Triage supersedes a pending "anything else?" offer.
        if let Some(id) = self.timers.follow_up.take() {
            self.scheduler.cancel(id);
        }
        let delay = self.timings.doctor_prompt_delay();
        self.timers.doctor_prompt = Some(self.scheduler.schedule(delay, ScheduledTask::DoctorPrompt));
    }

    fn maybe_schedule_follow_up(&mut self) {
        if self.flags.follow_up_made
            || self.timers.follow_up.is_some()
            || self.message_count < self.timings.follow_up_threshold
        {
            return;
        }
        let delay = self.timings.follow_up_delay();
        self.timers.follow_up = Some(self.scheduler.schedule(delay, ScheduledTask::FollowUpOffer));
    }

    fn rearm_inactivity(&mut self) {
        for id in [self.timers.check_in.take(), self.timers.session_end.take()]
            .into_iter()
            .flatten()
        {
            self.scheduler.cancel(id);
        }
        self.check_in_sent = false;
        self.last_activity = self.now();

        let check_in = self.timings.check_in_after();
        let session_end = self.timings.session_end_after();
        self.timers.check_in = Some(self.scheduler.schedule(check_in, ScheduledTask::CheckIn));
        self.timers.session_end = Some(self.scheduler.schedule(session_end, ScheduledTask::SessionEnd));
    }

    fn fire(&mut self, task: ScheduledTask) {
        match task {
            ScheduledTask::DoctorPrompt => {
                self.timers.doctor_prompt = None;
                self.flags.awaiting_doctor_choice = true;
                // A visible follow-up offer would otherwise linger behind the
                // doctor question and swallow the reply after it.
                self.flags.follow_up_offered = false;
                self.push_bot(responses::doctor_prompt(), |m| {
                    m.awaiting_doctor_choice = true;
                    m.awaiting_response = true;
                });
                let delay = self.timings.doctor_watchdog();
                self.timers.doctor_watchdog =
                    Some(self.scheduler.schedule(delay, ScheduledTask::DoctorWatchdog));
            }
            ScheduledTask::DoctorWatchdog => {
                self.timers.doctor_watchdog = None;
                // Only nudge when the next reply will be read as the answer
                if self.flags.gate() == Gate::DoctorChoice {
                    self.push_bot(responses::doctor_watchdog(), |_| {});
                }
            }
            ScheduledTask::FollowUpOffer => {
                self.timers.follow_up = None;
                if self.flags.gate() != Gate::Open || self.timers.doctor_prompt.is_some() {
                    tracing::debug!(session = %self.id, "Follow-up offer dropped: another question is pending");
                    return;
                }
                self.flags.follow_up_offered = true;
                self.flags.follow_up_made = true;
                self.push_bot(responses::follow_up_offer(), |m| {
                    m.awaiting_response = true;
                });
            }
            ScheduledTask::CheckIn => {
                self.timers.check_in = None;
                if !self.check_in_sent {
                    self.check_in_sent = true;
                    self.push_bot(responses::check_in(), |_| {});
                }
            }
            ScheduledTask::SessionEnd => {
                self.timers = Timers::default();
                self.scheduler.clear();
                self.push_bot(responses::session_ended(), |_| {});
                self.session_active = false;
                tracing::info!(session = %self.id, messages = self.messages.len(), "Chat session ended after inactivity");
            }
        }
    }

    fn push_bot(&mut self, reply: BotReply, decorate: impl FnOnce(&mut Message)) {
        let mut message = Message::bot(reply.text, reply.links, millis(self.now()));
        message.is_emergency = reply.is_emergency;
        message.is_urgent = reply.is_urgent;
        decorate(&mut message);
        self.messages.push(message);
    }
}

fn millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}
