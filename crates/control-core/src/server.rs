//! The control core itself: binds a TCP listener, accepts connections,
//! and dispatches decoded requests to a shared [`CameraController`]
//! (spec §4.6).

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tokio::net::{TcpListener, TcpStream};

use camera_controller::CameraController;
use daq_core::error::{EngineError, EngineResult};

use crate::codec::{decode_request, read_frame, write_reply};
use crate::message::{ControlReply, ControlRequest};

/// One control core bound to a single [`CameraController`] (spec §9's
/// registry re-architecture: the control core resolves its controller
/// through `camera_controller::ControllerRegistry` at composition-root
/// time, not through a raw back-pointer).
pub struct ControlCore {
    controller: Arc<CameraController>,
    run: Arc<AtomicBool>,
}

impl ControlCore {
    pub fn new(controller: Arc<CameraController>) -> Self {
        Self {
            controller,
            run: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn stop_flag(&self) -> Arc<AtomicBool> {
        self.run.clone()
    }

    pub fn stop(&self) {
        self.run.store(false, Ordering::Release);
    }

    /// Bind `endpoint` (e.g. `tcp://0.0.0.0:9001`) and serve requests
    /// until `stop()` is called. Accepts are polled with `poll_interval`
    /// bounded timeout (spec §4.6 step 1: "Poll the socket with bounded
    /// timeout (e.g. 100 ms)") so the run flag is re-checked promptly.
    pub async fn run(&self, endpoint: &str, poll_interval: Duration) -> EngineResult<()> {
        let addr = parse_endpoint(endpoint)?;
        let listener = TcpListener::bind(addr).await?;
        tracing::info!(%addr, "control core listening");
        self.serve(listener, poll_interval).await
    }

    /// Same as [`ControlCore::run`], but against an already-bound
    /// listener. Split out so tests can bind an OS-assigned ephemeral
    /// port (`127.0.0.1:0`) and read back the real address before
    /// serving, which `run`'s fixed-endpoint form cannot do.
    pub async fn serve(&self, listener: TcpListener, poll_interval: Duration) -> EngineResult<()> {
        while self.run.load(Ordering::Acquire) {
            match tokio::time::timeout(poll_interval, listener.accept()).await {
                Ok(Ok((stream, peer))) => {
                    let controller = self.controller.clone();
                    let run = self.run.clone();
                    tokio::spawn(async move {
                        tracing::debug!(%peer, "control client connected");
                        serve_connection(stream, controller, run).await;
                        tracing::debug!(%peer, "control client disconnected");
                    });
                }
                Ok(Err(e)) => tracing::warn!(error = %e, "accept failed"),
                Err(_timeout) => {} // poll timeout: loop back and recheck run flag
            }
        }
        Ok(())
    }
}

fn parse_endpoint(endpoint: &str) -> EngineResult<SocketAddr> {
    let addr = endpoint.strip_prefix("tcp://").unwrap_or(endpoint);
    addr.parse()
        .map_err(|e| EngineError::Configuration(format!("invalid control endpoint {endpoint}: {e}")))
}

/// One client's request/reply loop, playing the role of the ROUTER
/// socket's identity-routed connection (spec §4.6 step 5: replies are
/// "routed to the originating client identity").
async fn serve_connection(mut stream: TcpStream, controller: Arc<CameraController>, run: Arc<AtomicBool>) {
    while run.load(Ordering::Acquire) {
        let body = match read_frame(&mut stream).await {
            Ok(Some(body)) => body,
            Ok(None) => return, // client closed the connection
            Err(e) => {
                tracing::warn!(error = %e, "error reading control frame");
                return;
            }
        };

        let reply = match decode_request(&body) {
            Ok(request) => dispatch(&controller, request),
            Err((msg_id, decode_error)) => ControlReply::nack(
                msg_id,
                String::new(),
                format!("failed to decode control message: {decode_error}"),
            ),
        };

        if let Err(e) = write_reply(&mut stream, &reply).await {
            tracing::warn!(error = %e, "error writing control reply");
            return;
        }
    }
}

/// Step 2-3 of spec §4.6: dispatch on `msg_type`/`msg_val` and invoke
/// the controller, building an ACK or NACK reply.
fn dispatch(controller: &CameraController, request: ControlRequest) -> ControlReply {
    if request.msg_type != "cmd" {
        return ControlReply::nack(
            request.msg_id,
            request.msg_val.clone(),
            "illegal command request type",
        );
    }

    let outcome: Result<serde_json::Value, String> = match request.msg_val.as_str() {
        "configure" => controller
            .configure(&request.params)
            .map(|_| json!({}))
            .map_err(|e| e.to_string()),
        "request_configuration" => {
            let mut reply_params = json!({});
            controller
                .request_configuration(&mut reply_params)
                .map(|_| reply_params)
                .map_err(|e| e.to_string())
        }
        "status" => {
            let mut reply_params = json!({});
            controller.get_status(&mut reply_params);
            Ok(reply_params)
        }
        _ => Err("illegal command request value".to_string()),
    };

    match outcome {
        Ok(params) => ControlReply::ack(request.msg_id, request.msg_val, params),
        Err(err) => ControlReply::nack(request.msg_id, request.msg_val, err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use daq_core::config::CameraConfig;
    use serde_json::json;

    fn controller() -> CameraController {
        CameraController::new(CameraConfig {
            simulated_camera: true,
            ..Default::default()
        })
    }

    #[test]
    fn non_cmd_message_type_is_nacked() {
        let controller = controller();
        let request = ControlRequest {
            msg_id: 1,
            msg_type: "event".to_string(),
            msg_val: "status".to_string(),
            params: json!({}),
        };
        let reply = dispatch(&controller, request);
        assert_eq!(reply.msg_type, "nack");
        assert_eq!(reply.params["error"], "illegal command request type");
    }

    #[test]
    fn unknown_msg_val_is_nacked() {
        let controller = controller();
        let request = ControlRequest {
            msg_id: 2,
            msg_type: "cmd".to_string(),
            msg_val: "reboot".to_string(),
            params: json!({}),
        };
        let reply = dispatch(&controller, request);
        assert_eq!(reply.msg_type, "nack");
        assert_eq!(reply.params["error"], "illegal command request value");
    }

    #[test]
    fn scenario_s1_capture_before_connect_is_nacked_with_exact_message() {
        let controller = controller();
        let request = ControlRequest {
            msg_id: 3,
            msg_type: "cmd".to_string(),
            msg_val: "configure".to_string(),
            params: json!({"command": "capture"}),
        };
        let reply = dispatch(&controller, request);
        assert_eq!(reply.msg_type, "nack");
        assert_eq!(
            reply.params["error"],
            "capture is not valid in disconnected state"
        );
    }

    #[test]
    fn scenario_s2_connect_then_capture_acks_and_updates_status() {
        let controller = controller();
        let connect = ControlRequest {
            msg_id: 4,
            msg_type: "cmd".to_string(),
            msg_val: "configure".to_string(),
            params: json!({"command": "connect"}),
        };
        assert_eq!(dispatch(&controller, connect).msg_type, "ack");

        let capture = ControlRequest {
            msg_id: 5,
            msg_type: "cmd".to_string(),
            msg_val: "configure".to_string(),
            params: json!({"command": "capture"}),
        };
        assert_eq!(dispatch(&controller, capture).msg_type, "ack");

        let status = ControlRequest {
            msg_id: 6,
            msg_type: "cmd".to_string(),
            msg_val: "status".to_string(),
            params: json!({}),
        };
        let reply = dispatch(&controller, status);
        assert_eq!(reply.msg_type, "ack");
        assert_eq!(reply.params["status"]["camera_status"], "capturing");
        assert_eq!(reply.params["status"]["frame_number"], 0);
    }

    #[test]
    fn request_configuration_round_trip_is_a_no_op_ack() {
        let controller = controller();
        let request_config = ControlRequest {
            msg_id: 7,
            msg_type: "cmd".to_string(),
            msg_val: "request_configuration".to_string(),
            params: json!({}),
        };
        let reply = dispatch(&controller, request_config);
        assert_eq!(reply.msg_type, "ack");

        let camera_doc = reply.params["camera"].clone();
        let configure = ControlRequest {
            msg_id: 8,
            msg_type: "cmd".to_string(),
            msg_val: "configure".to_string(),
            params: json!({"camera": camera_doc}),
        };
        let reply = dispatch(&controller, configure);
        assert_eq!(reply.msg_type, "ack");
    }
}
