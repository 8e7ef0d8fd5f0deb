use crossbeam::atomic::AtomicCell;
use crossbeam::channel::{Receiver, Sender};
use log::info;
use std::sync::Arc;

///任务下发链路
///dispatch把任务负载发给机器人并返回关联id,完成结果稍后由链路
///自己的线程通过CommandProcessor::on_task_response送达
///dispatch必须立即返回,不能在dispatch的调用栈里同步回调
///on_task_response,任务线程此时还拿着等待锁,同步回调会死锁
pub trait TaskLink: Send + Sync {
    fn dispatch(&self, payload: Vec<u8>) -> i32;
}

///遥测发布通道,发出去就不管了,不等确认
pub trait StatusSink: Send + Sync {
    fn publish(&self, topic: &str, field: &str, value: &str);
    fn publish_bool(&self, topic: &str, field: &str, value: bool);
}

///把遥测写进日志的发布通道,没接外部总线的时候用
pub struct LogSink;

impl StatusSink for LogSink {
    fn publish(&self, topic: &str, field: &str, value: &str) {
        info!("publish topic:{} field:{} value:{}", topic, field, value);
    }

    fn publish_bool(&self, topic: &str, field: &str, value: bool) {
        info!("publish topic:{} field:{} value:{}", topic, field, value);
    }
}

///干跑链路:记录负载大小,把关联id丢给应答线程
///运维自检用,负载不会真正发到机器人
pub struct DryRunLink {
    next_id: AtomicCell<i32>,
    sender: Sender<i32>,
}

impl DryRunLink {
    ///返回链路和id接收端,调用方起一个应答线程消费接收端
    pub fn new() -> (Arc<DryRunLink>, Receiver<i32>) {
        let (sender, receiver) = crossbeam::channel::bounded(64);
        let link = DryRunLink {
            next_id: AtomicCell::new(1),
            sender,
        };
        (Arc::new(link), receiver)
    }
}

impl TaskLink for DryRunLink {
    fn dispatch(&self, payload: Vec<u8>) -> i32 {
        let id = self.next_id.fetch_add(1);
        info!("dry-run dispatch id:{} payload:{}bytes", id, payload.len());
        let _ = self.sender.send(id);
        id
    }
}
