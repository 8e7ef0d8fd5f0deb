use num_enum::IntoPrimitive;
use num_enum::TryFromPrimitive;

///机器人状态
#[derive(Debug, Copy, Clone, Eq, PartialEq, TryFromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum RobotState {
    Charging = 0, //在充电桩上
    Standby = 1,  //在停靠点,已挂载载具
    Idle = 2,     //在停靠点,无载具
    Disabled = 3, //被操作员禁用
    Error = 4,    //错误状态
}

impl Default for RobotState {
    fn default() -> Self {
        RobotState::Charging
    }
}

impl RobotState {
    ///转换成robot_status话题对应的字符串值
    pub fn status_str(self) -> &'static str {
        match self {
            RobotState::Charging => ROBOT_STATUS_CHARGING,
            RobotState::Standby => ROBOT_STATUS_STANDBY,
            RobotState::Idle => ROBOT_STATUS_IDLE,
            RobotState::Disabled => ROBOT_STATUS_DISABLED,
            RobotState::Error => ROBOT_STATUS_ERROR,
        }
    }
}

//遥测话题
pub const MISSION_STATUS_TOPIC: &str = "robot_command_status";
pub const ROBOT_STATUS_TOPIC: &str = "robot_status";
pub const DOOR_CONTROL_TOPIC: &str = "door_control";
pub const ROBOT_LOCATION_TOPIC: &str = "robot_location";

//遥测字段
pub const MISSION_STATUS_FIELD: &str = "success";
pub const ROBOT_STATUS_FIELD: &str = "status";
pub const DOOR_CONTROL_FIELD: &str = "open";
pub const ROBOT_LOCATION_FIELD: &str = "location";

//robot_status取值
pub const ROBOT_STATUS_STANDBY: &str = "standby";
pub const ROBOT_STATUS_IDLE: &str = "idle";
pub const ROBOT_STATUS_CHARGING: &str = "charging";
pub const ROBOT_STATUS_BUSY: &str = "busy";
pub const ROBOT_STATUS_DISABLED: &str = "disabled";
pub const ROBOT_STATUS_ERROR: &str = "error";

//机器人位置
pub const LOCATION_CHARGER: &str = "charger";
pub const LOCATION_MANIPULATOR: &str = "manipulator";
pub const LOCATION_HALLWAY: &str = "hallway";
pub const LOCATION_PARKING: &str = "parking";
pub const LOCATION_BED_PREFIX: &str = "bed_";

pub const MISSION_SUCCESS: bool = true;
pub const MISSION_FAIL: bool = false;
pub const DOOR_OPEN: bool = true;
pub const DOOR_CLOSE: bool = false;

//任务完成状态码(与机器人通讯协议一致)
pub const ERR_NONE: i32 = 0;
pub const ERR_TIMEOUT: i32 = -1;
pub const ERR_MISSION_ABORTED: i32 = -2;

///任务链路上所有可恢复的错误
#[derive(thiserror::Error, Debug)]
pub enum MissionError {
    #[error("Cannot Decode incoming JSON Command: {0}")]
    Decode(String),
    #[error("Error: Unknown Command: {0}")]
    UnknownCommand(String),
    #[error("Invalid Command. {0}")]
    Precondition(String),
    #[error("Error: Robot is currently running a task. Ignoring new command!")]
    RobotBusy,
    #[error("Error Trying to send mission file {0}. {1}")]
    TaskFile(String, String),
    #[error("Error: Timeout waiting for mission completion. MissionID: {0}")]
    TaskTimeout(i32),
    #[error("ERROR: Mission {0} failed. status: {1}")]
    TaskFailure(String, i32),
    #[error("Error: Mission Cancellation failed at: {0}")]
    RollbackFailure(String),
}
