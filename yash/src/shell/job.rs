use indexmap::IndexMap;
use nix::sys::signal::Signal;
use nix::unistd::Pid;
use tracing::debug;

use crate::process::{Job, JobState, WaitEvent};

/// What a status change did to the job it matched.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Transition {
    /// Stopped; the job keeps its place and number
    Stopped,
    /// A foreground job was stopped and re-filed as a numbered background job
    Suspended,
    Completed,
}

/// Every live job, in creation order, keyed by process group id.
#[derive(Debug, Default)]
pub struct JobTable {
    jobs: IndexMap<Pid, Job>,
}

impl JobTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Job> {
        self.jobs.values()
    }

    pub fn get(&self, pgid: Pid) -> Option<&Job> {
        self.jobs.get(&pgid)
    }

    pub fn get_mut(&mut self, pgid: Pid) -> Option<&mut Job> {
        self.jobs.get_mut(&pgid)
    }

    /// Append at the tail.
    pub fn add(&mut self, pgid: Pid, job: Job) {
        debug!("JOB_TABLE: add {} '{}' as {:?}", pgid, job.cmd, job.job_id);
        self.jobs.insert(pgid, job);
    }

    /// Unlink a job. Dropping the result frees it; re-adding it re-files it
    /// at the tail.
    pub fn remove(&mut self, pgid: Pid) -> Option<Job> {
        self.jobs.shift_remove(&pgid)
    }

    /// Unlink every completed job, keeping survivors in order.
    pub fn remove_all_done(&mut self) -> Vec<Job> {
        let (done, live): (Vec<_>, Vec<_>) = std::mem::take(&mut self.jobs)
            .into_iter()
            .partition(|(_, job)| job.state.is_completed());
        self.jobs = live.into_iter().collect();
        done.into_iter().map(|(_, job)| job).collect()
    }

    pub fn clear(&mut self) {
        self.jobs.clear();
    }

    /// Highest number held by a background job, 0 if there is none.
    pub fn most_recent_job_id(&self) -> usize {
        self.jobs
            .values()
            .filter(|job| job.background)
            .filter_map(|job| job.job_id)
            .max()
            .unwrap_or(0)
    }

    /// Lowest positive number not held by any job in the table.
    pub fn next_job_id(&self) -> usize {
        let mut id = 1;
        while self.jobs.values().any(|job| job.job_id == Some(id)) {
            id += 1;
        }
        id
    }

    /// The most recently added stopped background job.
    pub fn next_job_to_background(&self) -> Option<Pid> {
        self.jobs
            .iter()
            .rev()
            .find(|(_, job)| job.background && job.state.is_stopped())
            .map(|(pgid, _)| *pgid)
    }

    /// The most recently added job that has not completed.
    pub fn next_job_to_foreground(&self) -> Option<Pid> {
        self.jobs
            .iter()
            .rev()
            .find(|(_, job)| !job.state.is_completed())
            .map(|(pgid, _)| *pgid)
    }

    /// Apply one reaped status change. Events for unknown pids and for jobs
    /// that already completed are ignored.
    pub fn apply_event(&mut self, pgid: Pid, event: WaitEvent) -> Option<Transition> {
        let job = match self.jobs.get_mut(&pgid) {
            Some(job) => job,
            None => {
                debug!("JOB_TABLE: ignoring {:?} for unknown pid {}", event, pgid);
                return None;
            }
        };
        if job.state.is_completed() {
            debug!("JOB_TABLE: {} already completed, ignoring {:?}", pgid, event);
            return None;
        }

        let old_state = job.state;
        let transition = match event {
            WaitEvent::Stopped(signal) => {
                job.state = JobState::Stopped;
                if matches!(signal, Signal::SIGTSTP | Signal::SIGSTOP) {
                    job.background = true;
                    if job.job_id.is_none() {
                        return Some(self.refile_suspended(pgid));
                    }
                }
                Transition::Stopped
            }
            WaitEvent::Exited(code) => {
                job.state = JobState::Completed(code, None);
                Transition::Completed
            }
            WaitEvent::Signaled(signal) => {
                job.state = JobState::Completed(128u8.wrapping_add(signal as u8), Some(signal));
                Transition::Completed
            }
        };
        debug!(
            "JOB_STATE_CHANGE: {} {:?} -> {:?}",
            pgid, old_state, job.state
        );
        Some(transition)
    }

    /// Move a stopped foreground job to the tail with a fresh number.
    fn refile_suspended(&mut self, pgid: Pid) -> Transition {
        if let Some(mut job) = self.remove(pgid) {
            job.job_id = Some(self.next_job_id());
            debug!(
                "JOB_SUSPENDED: '{}' ({}) re-filed as job {:?}",
                job.cmd, pgid, job.job_id
            );
            self.add(pgid, job);
        }
        Transition::Suspended
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_command;

    fn init() {
        let _ = tracing_subscriber::fmt::try_init();
    }

    fn job(text: &str) -> Job {
        let line = parse_command(text).unwrap().unwrap();
        Job::new(text, line)
    }

    /// Register a job under a fake pgid the way the launcher does.
    fn add(table: &mut JobTable, pgid: i32, text: &str) -> Pid {
        let pgid = Pid::from_raw(pgid);
        let mut job = job(text);
        job.pgid = Some(pgid);
        if job.background {
            job.job_id = Some(table.next_job_id());
        }
        table.add(pgid, job);
        pgid
    }

    fn ids(table: &JobTable) -> Vec<Option<usize>> {
        table.iter().map(|job| job.job_id).collect()
    }

    #[test]
    fn background_jobs_are_numbered_in_order() {
        init();
        let mut table = JobTable::new();
        assert_eq!(table.most_recent_job_id(), 0);
        add(&mut table, 100, "sleep 10 &");
        add(&mut table, 200, "sleep 20 &");
        assert_eq!(ids(&table), vec![Some(1), Some(2)]);
        assert_eq!(table.most_recent_job_id(), 2);
    }

    #[test]
    fn vacated_numbers_are_reused() {
        init();
        let mut table = JobTable::new();
        let a = add(&mut table, 100, "sleep 1 &");
        add(&mut table, 200, "sleep 20 &");

        table.apply_event(a, WaitEvent::Exited(0));
        let done = table.remove_all_done();
        assert_eq!(done.len(), 1);
        assert_eq!(done[0].cmd, "sleep 1");

        let c = add(&mut table, 300, "sleep 30 &");
        assert_eq!(table.get(c).unwrap().job_id, Some(1));
        assert_eq!(table.most_recent_job_id(), 2);
    }

    #[test]
    fn top_number_is_reused_after_removal() {
        init();
        let mut table = JobTable::new();
        add(&mut table, 100, "sleep 10 &");
        let b = add(&mut table, 200, "sleep 1 &");
        table.apply_event(b, WaitEvent::Signaled(Signal::SIGTERM));
        table.remove_all_done();
        let c = add(&mut table, 300, "sleep 30 &");
        assert_eq!(table.get(c).unwrap().job_id, Some(2));
    }

    #[test]
    fn remove_all_done_preserves_survivor_order() {
        init();
        let mut table = JobTable::new();
        let a = add(&mut table, 100, "a &");
        let b = add(&mut table, 200, "b &");
        let c = add(&mut table, 300, "c &");
        let d = add(&mut table, 400, "d &");
        table.apply_event(b, WaitEvent::Exited(0));
        table.apply_event(d, WaitEvent::Exited(1));

        let done: Vec<String> = table.remove_all_done().into_iter().map(|j| j.cmd).collect();
        assert_eq!(done, vec!["b", "d"]);
        let pgids: Vec<Option<Pid>> = table.iter().map(|job| job.pgid).collect();
        assert_eq!(pgids, vec![Some(a), Some(c)]);
    }

    #[test]
    fn stop_reclassifies_foreground_job() {
        init();
        let mut table = JobTable::new();
        let fg = add(&mut table, 100, "vim notes.txt");
        let bg = add(&mut table, 200, "sleep 30 &");
        assert_eq!(table.get(fg).unwrap().job_id, None);

        let transition = table.apply_event(fg, WaitEvent::Stopped(Signal::SIGTSTP));
        assert_eq!(transition, Some(Transition::Suspended));

        let job = table.get(fg).unwrap();
        assert_eq!(job.state, JobState::Stopped);
        assert!(job.background);
        assert_eq!(job.job_id, Some(2));
        // re-filed at the tail
        let order: Vec<Option<Pid>> = table.iter().map(|job| job.pgid).collect();
        assert_eq!(order, vec![Some(bg), Some(fg)]);
        assert_eq!(table.next_job_to_background(), Some(fg));
    }

    #[test]
    fn stop_by_other_signal_does_not_reclassify() {
        init();
        let mut table = JobTable::new();
        let fg = add(&mut table, 100, "cat");
        let transition = table.apply_event(fg, WaitEvent::Stopped(Signal::SIGTTIN));
        assert_eq!(transition, Some(Transition::Stopped));
        let job = table.get(fg).unwrap();
        assert_eq!(job.state, JobState::Stopped);
        assert!(!job.background);
        assert_eq!(job.job_id, None);
    }

    #[test]
    fn stopped_background_job_keeps_its_number() {
        init();
        let mut table = JobTable::new();
        let a = add(&mut table, 100, "sleep 30 &");
        add(&mut table, 200, "sleep 40 &");
        let transition = table.apply_event(a, WaitEvent::Stopped(Signal::SIGSTOP));
        assert_eq!(transition, Some(Transition::Stopped));
        assert_eq!(table.get(a).unwrap().job_id, Some(1));
        assert_eq!(ids(&table), vec![Some(1), Some(2)]);
    }

    #[test]
    fn completion_is_terminal() {
        init();
        let mut table = JobTable::new();
        let a = add(&mut table, 100, "sleep 30 &");
        assert_eq!(
            table.apply_event(a, WaitEvent::Signaled(Signal::SIGKILL)),
            Some(Transition::Completed)
        );
        assert_eq!(
            table.get(a).unwrap().state,
            JobState::Completed(137, Some(Signal::SIGKILL))
        );
        assert_eq!(table.apply_event(a, WaitEvent::Stopped(Signal::SIGSTOP)), None);
        assert!(table.get(a).unwrap().state.is_completed());
    }

    #[test]
    fn unknown_pid_is_ignored() {
        init();
        let mut table = JobTable::new();
        add(&mut table, 100, "sleep 30 &");
        assert_eq!(
            table.apply_event(Pid::from_raw(999), WaitEvent::Exited(0)),
            None
        );
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn job_selection_prefers_latest() {
        init();
        let mut table = JobTable::new();
        assert_eq!(table.next_job_to_background(), None);
        assert_eq!(table.next_job_to_foreground(), None);

        let a = add(&mut table, 100, "sleep 10 &");
        let b = add(&mut table, 200, "sleep 20 &");
        let c = add(&mut table, 300, "sleep 30 &");
        table.apply_event(a, WaitEvent::Stopped(Signal::SIGSTOP));
        table.apply_event(b, WaitEvent::Stopped(Signal::SIGSTOP));
        table.apply_event(c, WaitEvent::Exited(0));

        assert_eq!(table.next_job_to_background(), Some(b));
        assert_eq!(table.next_job_to_foreground(), Some(b));

        table.get_mut(b).unwrap().state = JobState::Running;
        assert_eq!(table.next_job_to_background(), Some(a));
        assert_eq!(table.next_job_to_foreground(), Some(b));
    }

    #[test]
    fn remove_detaches_without_touching_others() {
        init();
        let mut table = JobTable::new();
        let a = add(&mut table, 100, "sleep 10 &");
        let b = add(&mut table, 200, "sleep 20 &");
        let detached = table.remove(a).unwrap();
        assert_eq!(detached.cmd, "sleep 10");
        assert!(table.remove(a).is_none());
        table.add(a, detached);
        let order: Vec<Option<Pid>> = table.iter().map(|job| job.pgid).collect();
        assert_eq!(order, vec![Some(b), Some(a)]);
    }
}
