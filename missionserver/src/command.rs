use serde::Deserialize;

///外部送进来的JSON指令,接受之后不再变化
#[derive(Debug, Clone, Deserialize)]
pub struct CommandRequest {
    pub command: String, //指令名
    #[serde(default)]
    pub bed_id: Option<u32>, //病床编号,部分指令需要
}

///指令词汇表
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum MissionCmd {
    Dock,
    Undock,
    Deliver,
    Collect,
    Park,
    DoorOpen,
    DoorClose,
    SafetyOn,
    SafetyOff,
    GripperExtend,
    GripperRetract,
    GripperClamp,
    GripperRelease,
    GripperExtendedClamp,
    GripperExtendedRelease,
    Enable,
    Disable,
    SelfTest,
    Shutdown,
    CancelMission,
}

impl MissionCmd {
    ///把指令名解析成枚举,不认识的指令返回None
    pub fn parse(tag: &str) -> Option<MissionCmd> {
        let cmd = match tag {
            "dock" => MissionCmd::Dock,
            "undock" => MissionCmd::Undock,
            "deliver" => MissionCmd::Deliver,
            "collect" => MissionCmd::Collect,
            "park" => MissionCmd::Park,
            "door_open" => MissionCmd::DoorOpen,
            "door_close" => MissionCmd::DoorClose,
            "safety_on" => MissionCmd::SafetyOn,
            "safety_off" => MissionCmd::SafetyOff,
            "gripper_extend" => MissionCmd::GripperExtend,
            "gripper_retract" => MissionCmd::GripperRetract,
            "gripper_clamp" => MissionCmd::GripperClamp,
            "gripper_release" => MissionCmd::GripperRelease,
            "gripper_extended_clamp" => MissionCmd::GripperExtendedClamp,
            "gripper_extended_release" => MissionCmd::GripperExtendedRelease,
            "enable" => MissionCmd::Enable,
            "disable" => MissionCmd::Disable,
            "self_test" => MissionCmd::SelfTest,
            "shutdown" => MissionCmd::Shutdown,
            "cancel_mission" => MissionCmd::CancelMission,
            _ => return None,
        };
        Some(cmd)
    }

    pub fn tag(self) -> &'static str {
        match self {
            MissionCmd::Dock => "dock",
            MissionCmd::Undock => "undock",
            MissionCmd::Deliver => "deliver",
            MissionCmd::Collect => "collect",
            MissionCmd::Park => "park",
            MissionCmd::DoorOpen => "door_open",
            MissionCmd::DoorClose => "door_close",
            MissionCmd::SafetyOn => "safety_on",
            MissionCmd::SafetyOff => "safety_off",
            MissionCmd::GripperExtend => "gripper_extend",
            MissionCmd::GripperRetract => "gripper_retract",
            MissionCmd::GripperClamp => "gripper_clamp",
            MissionCmd::GripperRelease => "gripper_release",
            MissionCmd::GripperExtendedClamp => "gripper_extended_clamp",
            MissionCmd::GripperExtendedRelease => "gripper_extended_release",
            MissionCmd::Enable => "enable",
            MissionCmd::Disable => "disable",
            MissionCmd::SelfTest => "self_test",
            MissionCmd::Shutdown => "shutdown",
            MissionCmd::CancelMission => "cancel_mission",
        }
    }
}
