//! Machine worker queue
//!
//! Vision and motion run on a single machine worker. The alignment process
//! submits one request at a time and awaits its completion; the hardware
//! side runs `serve()` against whatever implements the capability traits.

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::channel::Channel;
use portable_atomic::{AtomicU32, Ordering};

use registra_core::geometry::Location;
use registra_core::traits::{
    FiducialLocator, LocateError, LocateRequest, MotionController, MotionError,
};

/// Only one request is ever in flight
const QUEUE_DEPTH: usize = 1;

/// Work submitted to the machine worker
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum WorkRequest {
    Locate(LocateRequest),
    MoveNear(Location),
    ToolLocation,
}

/// Completion reported by the machine worker
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum WorkResult {
    Located(Result<Location, LocateError>),
    Moved(Result<(), MotionError>),
    Tool(Result<Location, MotionError>),
}

/// Request tagged with the submitter's sequence number
struct Job {
    seq: u32,
    request: WorkRequest,
}

/// Result echoing the sequence number of its request
struct Completion {
    seq: u32,
    result: WorkResult,
}

/// Request/result channel pair for the machine worker
pub struct WorkQueue<M: RawMutex> {
    requests: Channel<M, Job, QUEUE_DEPTH>,
    results: Channel<M, Completion, QUEUE_DEPTH>,
    next_seq: AtomicU32,
}

impl<M: RawMutex> Default for WorkQueue<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: RawMutex> WorkQueue<M> {
    pub const fn new() -> Self {
        Self {
            requests: Channel::new(),
            results: Channel::new(),
            next_seq: AtomicU32::new(0),
        }
    }

    /// Handle for submitting work
    pub fn client(&self) -> WorkClient<'_, M> {
        WorkClient { queue: self }
    }

    /// Run requests against `backend` forever
    pub async fn serve<B>(&self, backend: &mut B)
    where
        B: FiducialLocator + MotionController,
    {
        loop {
            let Job { seq, request } = self.requests.receive().await;
            trace!("Worker request {}: {:?}", seq, request);
            let result = match request {
                WorkRequest::Locate(request) => {
                    WorkResult::Located(backend.locate(&request).await)
                }
                WorkRequest::MoveNear(target) => {
                    WorkResult::Moved(backend.move_near(&target).await)
                }
                WorkRequest::ToolLocation => WorkResult::Tool(backend.tool_location().await),
            };
            self.results.send(Completion { seq, result }).await;
        }
    }
}

/// Submits work to a `WorkQueue` and awaits completion
///
/// Implements the capability traits, so the alignment process can use it in
/// place of a direct locator or motion controller.
pub struct WorkClient<'q, M: RawMutex> {
    queue: &'q WorkQueue<M>,
}

impl<M: RawMutex> Clone for WorkClient<'_, M> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<M: RawMutex> Copy for WorkClient<'_, M> {}

impl<M: RawMutex> WorkClient<'_, M> {
    /// Send `request` and wait for its own result
    ///
    /// A caller that dropped an earlier submit leaves that result queued;
    /// it is recognised by sequence number and discarded.
    async fn submit(&self, request: WorkRequest) -> WorkResult {
        let seq = self.queue.next_seq.fetch_add(1, Ordering::Relaxed);
        self.queue.requests.send(Job { seq, request }).await;
        loop {
            let completion = self.queue.results.receive().await;
            if completion.seq == seq {
                return completion.result;
            }
            warn!("Discarding stale worker result {}", completion.seq);
        }
    }
}

impl<M: RawMutex> FiducialLocator for WorkClient<'_, M> {
    async fn locate(&mut self, request: &LocateRequest) -> Result<Location, LocateError> {
        match self.submit(WorkRequest::Locate(request.clone())).await {
            WorkResult::Located(result) => result,
            other => {
                error!("Unexpected worker result: {:?}", other);
                Err(LocateError::WorkerFault)
            }
        }
    }
}

impl<M: RawMutex> MotionController for WorkClient<'_, M> {
    async fn move_near(&mut self, target: &Location) -> Result<(), MotionError> {
        match self.submit(WorkRequest::MoveNear(*target)).await {
            WorkResult::Moved(result) => result,
            other => {
                error!("Unexpected worker result: {:?}", other);
                Err(MotionError::WorkerFault)
            }
        }
    }

    async fn tool_location(&mut self) -> Result<Location, MotionError> {
        match self.submit(WorkRequest::ToolLocation).await {
            WorkResult::Tool(result) => result,
            other => {
                error!("Unexpected worker result: {:?}", other);
                Err(MotionError::WorkerFault)
            }
        }
    }
}
