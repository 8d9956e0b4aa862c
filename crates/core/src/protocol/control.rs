use crate::camera::{ControlParam, SharedCamera};
use crate::error::{CamError, Result};
use crate::protocol::response::HttpResponse;

/// Apply one `/control` request to the camera's sensor.
///
/// Stateless; the only side effect is the sensor mutation. A change can
/// land while a frame is being captured and show up one frame late.
pub fn apply(camera: &SharedCamera, var: Option<&str>, val: Option<&str>) -> Result<ControlParam> {
    let (Some(var), Some(val)) = (var, val) else {
        return Err(CamError::MissingParameters);
    };

    let param = ControlParam::parse(var, val)?;

    let mut camera = camera.lock();
    let sensor = camera.sensor().ok_or(CamError::SensorNotFound)?;
    sensor.apply(param)?;
    Ok(param)
}

/// Map the outcome of [`apply`] to the response the browser UI expects.
pub fn respond(outcome: &Result<ControlParam>) -> HttpResponse {
    match outcome {
        Ok(_) => HttpResponse::ok().text("OK"),
        Err(CamError::MissingParameters) => HttpResponse::bad_request().text("Missing parameters"),
        Err(CamError::InvalidResolution(_)) => {
            HttpResponse::bad_request().text("Invalid resolution")
        }
        Err(CamError::UnknownParameter(_)) => HttpResponse::bad_request().text("Unknown parameter"),
        Err(CamError::InvalidValue { .. }) => HttpResponse::bad_request().text("Invalid value"),
        Err(CamError::SensorNotFound) => HttpResponse::internal_error().text("Sensor not found"),
        Err(_) => HttpResponse::internal_error().text("Failed to set parameter"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::{self, CameraConfig, Frame, FrameSize, FrameSource, Sensor, TestPatternCamera};
    use std::time::Duration;

    fn make_camera() -> SharedCamera {
        camera::shared(
            TestPatternCamera::init(CameraConfig {
                frame_size: FrameSize::Vga,
                jpeg_quality: 10,
                capture_interval: Duration::ZERO,
            })
            .unwrap(),
        )
    }

    struct Headless;

    impl FrameSource for Headless {
        fn acquire(&mut self) -> Option<Frame> {
            None
        }

        fn release(&mut self, frame: Frame) -> Result<()> {
            Err(CamError::FrameNotOutstanding(frame.seq()))
        }
    }

    impl camera::Camera for Headless {
        fn sensor(&mut self) -> Option<&mut dyn Sensor> {
            None
        }
    }

    fn status_and_body(resp: HttpResponse) -> (u16, String) {
        (resp.status_code, resp.body.unwrap_or_default())
    }

    #[test]
    fn resolution_change_is_applied() {
        let cam = make_camera();
        let outcome = apply(&cam, Some("resolution"), Some("SVGA"));
        assert_eq!(status_and_body(respond(&outcome)), (200, "OK".into()));

        let frame = cam.lock().acquire().unwrap();
        assert_eq!(frame.size().dimensions(), (800, 600));
    }

    #[test]
    fn invalid_resolution() {
        let cam = make_camera();
        let outcome = apply(&cam, Some("resolution"), Some("FOO"));
        assert_eq!(
            status_and_body(respond(&outcome)),
            (400, "Invalid resolution".into())
        );
    }

    #[test]
    fn out_of_range_value_fails() {
        let cam = make_camera();
        let outcome = apply(&cam, Some("brightness"), Some("9"));
        assert_eq!(
            status_and_body(respond(&outcome)),
            (500, "Failed to set parameter".into())
        );
    }

    #[test]
    fn missing_parameters() {
        let cam = make_camera();
        for (var, val) in [(None, None), (Some("brightness"), None), (None, Some("1"))] {
            let outcome = apply(&cam, var, val);
            assert_eq!(
                status_and_body(respond(&outcome)),
                (400, "Missing parameters".into())
            );
        }
    }

    #[test]
    fn unknown_parameter_is_rejected() {
        let cam = make_camera();
        let outcome = apply(&cam, Some("zoom"), Some("2"));
        assert_eq!(
            status_and_body(respond(&outcome)),
            (400, "Unknown parameter".into())
        );
    }

    #[test]
    fn non_numeric_value_is_rejected() {
        let cam = make_camera();
        let outcome = apply(&cam, Some("contrast"), Some("lots"));
        assert_eq!(
            status_and_body(respond(&outcome)),
            (400, "Invalid value".into())
        );
    }

    #[test]
    fn missing_sensor() {
        let cam = camera::shared(Headless);
        let outcome = apply(&cam, Some("brightness"), Some("1"));
        assert_eq!(
            status_and_body(respond(&outcome)),
            (500, "Sensor not found".into())
        );
    }

    #[test]
    fn accepted_value_reaches_sensor() {
        let cam = make_camera();
        assert_eq!(
            apply(&cam, Some("hmirror"), Some("1")).unwrap(),
            ControlParam::HMirror(1)
        );
        let status = cam.lock().sensor().unwrap().status();
        assert!(status.hmirror);
    }
}
