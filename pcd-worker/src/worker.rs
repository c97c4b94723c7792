use std::{io, thread};

use crossbeam::channel::{self, Receiver, Sender};

use crate::{
    error::PipelineError,
    request::{DecodeRequest, DecodeResponse},
    runner::{DecodePipeline, Executor},
};

type Reply = Result<DecodeResponse, PipelineError>;

struct Job {
    request: DecodeRequest,
    reply: Sender<Reply>,
}

/// Runs a [`DecodePipeline`] on its own thread. Requests are handled strictly in submission
/// order, one at a time, so the pipeline never sees two requests at once.
pub struct Worker {
    sender: Option<Sender<Job>>,
    handle: Option<thread::JoinHandle<()>>,
}

/// The pending reply to one submitted request.
pub struct Ticket {
    receiver: Receiver<Reply>,
}

impl Ticket {
    pub fn wait(self) -> Reply {
        self.receiver
            .recv()
            .map_err(|_| PipelineError::WorkerGone)?
    }
}

impl Worker {
    pub fn spawn(pipeline: DecodePipeline) -> io::Result<Self> {
        let (sender, receiver) = channel::unbounded::<Job>();
        let handle = thread::Builder::new()
            .name("pcd-decode".to_string())
            .spawn(move || {
                for job in receiver {
                    let reply = pipeline.execute(job.request);
                    // the caller may have dropped its ticket
                    let _ = job.reply.send(reply);
                }
                log::debug!("decode worker stopped");
            })?;

        Ok(Self {
            sender: Some(sender),
            handle: Some(handle),
        })
    }

    pub fn submit(&self, request: DecodeRequest) -> Result<Ticket, PipelineError> {
        let (reply, receiver) = channel::bounded(1);
        self.sender
            .as_ref()
            .ok_or(PipelineError::WorkerGone)?
            .send(Job { request, reply })
            .map_err(|_| PipelineError::WorkerGone)?;
        Ok(Ticket { receiver })
    }

    /// Submits and blocks until the reply arrives.
    pub fn decode(&self, request: DecodeRequest) -> Reply {
        self.submit(request)?.wait()
    }
}

impl Drop for Worker {
    fn drop(&mut self) {
        // closing the channel ends the receive loop once queued jobs are done
        self.sender.take();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::error!("decode worker panicked");
            }
        }
    }
}
