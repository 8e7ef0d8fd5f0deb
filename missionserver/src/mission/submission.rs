use crate::mission::task_name::TaskName;
use crate::status::RobotState;

///一条遥测发布项,跟随所属步骤成功之后发布
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum Telemetry {
    Msg {
        topic: &'static str,
        field: &'static str,
        value: String,
    },
    Bool {
        topic: &'static str,
        field: &'static str,
        value: bool,
    },
}

///一个SubMission只包含一个原子任务
///可以带零个或多个fallback任务,fallback只在取消回滚的时候使用
///retry_limit默认为1,即不自动重发
#[derive(Debug, Clone)]
pub struct SubMission {
    pub task: TaskName,               //主任务
    pub fallback_tasks: Vec<TaskName>, //回滚用的fallback链
    pub fallback_allowed: bool,       //是否允许回滚该步骤
    pub retry_limit: u32,             //主任务最大下发次数
    pub description: String,          //给操作员看的说明
    pub publishes: Vec<Telemetry>,    //步骤成功后要发布的遥测
}

impl SubMission {
    pub fn new(task: TaskName) -> Self {
        SubMission {
            task,
            fallback_tasks: Vec::new(),
            fallback_allowed: true,
            retry_limit: 1,
            description: String::new(),
            publishes: Vec::new(),
        }
    }

    pub fn fallback(mut self, task: TaskName) -> Self {
        self.fallback_tasks.push(task);
        self
    }

    pub fn no_fallback(mut self) -> Self {
        self.fallback_allowed = false;
        self
    }

    pub fn retry_limit(mut self, limit: u32) -> Self {
        self.retry_limit = limit.max(1);
        self
    }

    pub fn describe(mut self, desc: &str) -> Self {
        self.description = desc.to_owned();
        self
    }

    pub fn publish(mut self, telemetry: Telemetry) -> Self {
        self.publishes.push(telemetry);
        self
    }
}

///一条指令展开后的完整任务计划,只消费一次
#[derive(Debug, Clone)]
pub struct MissionPlan {
    pub steps: Vec<SubMission>,             //按顺序执行的步骤
    pub success_state: Option<RobotState>,  //全部成功后的目标状态,None表示状态不变
    pub success_publishes: Vec<Telemetry>,  //全部成功后发布的遥测
}

impl MissionPlan {
    pub fn new(steps: Vec<SubMission>) -> Self {
        MissionPlan {
            steps,
            success_state: None,
            success_publishes: Vec::new(),
        }
    }

    pub fn success_state(mut self, state: RobotState) -> Self {
        self.success_state = Some(state);
        self
    }

    pub fn publish(mut self, telemetry: Telemetry) -> Self {
        self.success_publishes.push(telemetry);
        self
    }
}
