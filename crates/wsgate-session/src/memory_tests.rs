use super::*;

use std::sync::Arc;
use std::sync::atomic::AtomicUsize;
use std::time::Duration;

use bytes::Bytes;

fn soon() -> Instant {
    Instant::now() + Duration::from_secs(1)
}

#[tokio::test]
async fn test_data_frames_arrive_in_order() {
    let (left, right) = pair();
    left.send_data("one".to_string()).await.unwrap();
    left.send_data("two".to_string()).await.unwrap();

    assert_eq!(right.recv().await.unwrap(), Frame::Text("one".to_string()));
    assert_eq!(right.recv().await.unwrap(), Frame::Text("two".to_string()));
}

#[tokio::test(start_paused = true)]
async fn test_ping_answered_and_pong_callback_invoked() {
    let (left, right) = pair();
    let right = Arc::new(right);

    let pongs = Arc::new(AtomicUsize::new(0));
    let counter = pongs.clone();
    left.on_pong(Arc::new(move || {
        counter.fetch_add(1, Ordering::SeqCst);
    }));

    let reader = right.clone();
    let reading = tokio::spawn(async move { reader.recv().await });

    left.send_control(Control::Ping(Bytes::from_static(b"alive")), soon())
        .await
        .unwrap();
    left.set_read_deadline(Some(Instant::now() + Duration::from_millis(100)));
    assert_eq!(left.recv().await, Err(TransportError::Timeout));
    assert_eq!(pongs.load(Ordering::SeqCst), 1);

    right.close().await.unwrap();
    assert_eq!(reading.await.unwrap(), Err(TransportError::ConnectionClosed));
}

#[tokio::test]
async fn test_close_frame_ends_receive_and_is_echoed() {
    let (left, right) = pair();
    left.send_control(Control::close(CloseCode::GOING_AWAY), soon())
        .await
        .unwrap();

    let err = right.recv().await.unwrap_err();
    assert_eq!(err.close_code(), Some(CloseCode::GOING_AWAY));

    let echo = left.recv().await.unwrap_err();
    assert_eq!(echo.close_code(), Some(CloseCode::GOING_AWAY));
}

#[tokio::test]
async fn test_data_after_close_sent_fails() {
    let (left, _right) = pair();
    left.send_control(Control::close(CloseCode::NORMAL), soon())
        .await
        .unwrap();

    assert!(matches!(
        left.send_data("late".to_string()).await,
        Err(TransportError::Protocol(_))
    ));
    assert!(
        left.send_control(Control::close(CloseCode::NORMAL), soon())
            .await
            .is_err()
    );
}

#[tokio::test]
async fn test_closed_peer_looks_abnormal() {
    let (left, right) = pair();
    left.close().await.unwrap();

    let err = right.recv().await.unwrap_err();
    assert_eq!(
        err,
        TransportError::Closed {
            code: CloseCode::ABNORMAL,
            reason: "unexpected EOF".to_string(),
        }
    );
}

#[tokio::test]
async fn test_dropped_peer_breaks_sends() {
    let (left, right) = pair();
    drop(right);
    assert!(matches!(
        left.send_data("anyone?".to_string()).await,
        Err(TransportError::Io(_))
    ));
}

#[tokio::test(start_paused = true)]
async fn test_read_deadline_expires() {
    let (left, _right) = pair();
    left.set_read_deadline(Some(Instant::now() + Duration::from_millis(50)));
    assert_eq!(left.recv().await, Err(TransportError::Timeout));
}

#[tokio::test(start_paused = true)]
async fn test_expired_write_deadline() {
    let (left, _right) = pair();
    left.set_write_deadline(Some(Instant::now()));
    assert_eq!(
        left.send_data("slow".to_string()).await,
        Err(TransportError::Timeout)
    );

    left.set_write_deadline(None);
    assert!(left.send_data("fine".to_string()).await.is_ok());
}

#[tokio::test]
async fn test_close_releases_pending_receive() {
    let (left, _right) = pair();
    let left = Arc::new(left);

    let reader = left.clone();
    let reading = tokio::spawn(async move { reader.recv().await });
    tokio::task::yield_now().await;

    left.close().await.unwrap();
    assert!(left.is_closed());
    assert_eq!(reading.await.unwrap(), Err(TransportError::ConnectionClosed));
}

#[tokio::test]
async fn test_use_after_close() {
    let (left, _right) = pair();
    left.close().await.unwrap();

    assert_eq!(left.close().await, Err(TransportError::ConnectionClosed));
    assert_eq!(left.recv().await, Err(TransportError::ConnectionClosed));
    assert_eq!(
        left.send_data("gone".to_string()).await,
        Err(TransportError::ConnectionClosed)
    );
}
